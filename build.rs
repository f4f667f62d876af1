// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: database path
fn db_path_arg() -> Arg {
    Arg::new("db_path")
        .short('d')
        .long("db-path")
        .value_name("PATH")
        .default_value("/var/lib/bower-cache/registry.db")
        .help("Path to the database file")
}

/// Common argument: configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("TOML configuration file")
}

fn build_cli() -> Command {
    Command::new("bower-cache")
        .version(env!("CARGO_PKG_VERSION"))
        .author("bower-cache Contributors")
        .about("Caching proxy registry for Bower packages")
        .subcommand_required(true)
        .subcommand(
            Command::new("init")
                .about("Create or migrate the catalog database")
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the registry HTTP server")
                .arg(config_arg())
                .arg(
                    Arg::new("bind")
                        .short('b')
                        .long("bind")
                        .value_name("ADDR")
                        .help("Override the bind address from the configuration"),
                ),
        )
        .subcommand(
            Command::new("package")
                .about("Catalog administration")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Register a package under a fixed URL")
                        .arg(Arg::new("name").required(true).help("Package name"))
                        .arg(Arg::new("url").required(true).help("URL returned for the package"))
                        .arg(db_path_arg()),
                )
                .subcommand(
                    Command::new("list")
                        .about("List registered packages")
                        .arg(db_path_arg()),
                )
                .subcommand(
                    Command::new("search")
                        .about("Search registered packages by name fragment")
                        .arg(Arg::new("fragment").required(true).help("Case-insensitive name fragment"))
                        .arg(db_path_arg()),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Remove a registered package")
                        .arg(Arg::new("name").required(true).help("Package name"))
                        .arg(db_path_arg()),
                ),
        )
        .subcommand(
            Command::new("mirror")
                .about("Inspect local mirrors")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List mirrored repositories and their origins")
                        .arg(
                            Arg::new("repo_root")
                                .short('r')
                                .long("repo-root")
                                .default_value("/var/git")
                                .help("Directory holding the mirrors"),
                        ),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve one package the way the server would")
                .arg(Arg::new("name").required(true).help("Package name"))
                .arg(config_arg())
                .arg(
                    Arg::new("host")
                        .long("host")
                        .default_value("localhost")
                        .help("Host the request is pretended to arrive on"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("bower-cache.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
