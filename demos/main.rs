use gofetch::{Api, Config};

fn main() {
    let api = match Api::new(Config::new()) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("error creating client: {e}");
            return;
        }
    };

    // List what this machine could install
    let catalog = match api.catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("error fetching downloads: {e}");
            return;
        }
    };
    for entry in catalog.listing(api.host(), false) {
        println!("{} [{}] {}", entry.version().unwrap_or("?"), entry.platform_label(), entry.url());
    }

    // Resolve a keyword without installing anything
    match api.resolve(&catalog, "latest") {
        Ok(entry) => println!("latest is {}", entry.url()),
        Err(e) => eprintln!("{e}"),
    }

    // Install a specific version into a scratch directory
    if let Err(e) = std::fs::create_dir_all("./scratch") {
        eprintln!("error creating scratch directory: {e}");
        return;
    }
    let api = match Api::new(Config::new().set_install_root("./scratch/go")) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("error creating client: {e}");
            return;
        }
    };
    let result = api
        .resolve(&catalog, "1.19.4")
        .and_then(|entry| api.install(entry));

    match result {
        Ok(report) => println!("installed into {}", report.root.display()),
        Err(e) => eprintln!("error installing go: {e}"),
    }
}
