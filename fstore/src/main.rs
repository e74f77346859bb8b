use clap::{arg, command, crate_name, ArgMatches, Command};
use client::FileParams;

mod cli;

#[tokio::main]
async fn main() {
    let cli = command!(crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand(Command::new(cli::VERSION_SUBCOMMAND).about(cli::VERSION_DESCRIPTION))
        .subcommand(Command::new(cli::BUGREPORT_SUBCOMMAND).about(cli::BUGREPORT_DESCRIPTION))
        .subcommand(Command::new(cli::SERVER_SUBCOMMAND).about(cli::SERVER_DESCRIPTION))
        .subcommand(
            Command::new(cli::UPLOAD_SUBCOMMAND)
                .about(cli::UPLOAD_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI"))
                .arg(
                    arg!(-f --file <FILE>)
                        .required(true)
                        .help("Path to file to upload"),
                ),
        )
        .subcommand(
            Command::new(cli::LIST_SUBCOMMAND)
                .about(cli::LIST_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI")),
        )
        .subcommand(
            Command::new(cli::INFO_SUBCOMMAND)
                .about(cli::INFO_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI"))
                .arg(arg!(-i --id <ID>).required(true).help("File id")),
        )
        .subcommand(
            Command::new(cli::DOWNLOAD_SUBCOMMAND)
                .about(cli::DOWNLOAD_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI"))
                .arg(arg!(-i --id <ID>).required(true).help("File id"))
                .arg(arg!(-o --output [PATH]).help("Where to put the downloaded file")),
        )
        .subcommand(
            Command::new(cli::DELETE_SUBCOMMAND)
                .about(cli::DELETE_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI"))
                .arg(arg!(-i --id <ID>).required(true).help("File id")),
        )
        .arg_required_else_help(true)
        .disable_version_flag(true)
        .get_matches();

    if cli.subcommand_matches(cli::VERSION_SUBCOMMAND).is_some() {
        cli::version::run();
    } else if cli.subcommand_matches(cli::BUGREPORT_SUBCOMMAND).is_some() {
        cli::bugreport::run();
    } else if cli.subcommand_matches(cli::SERVER_SUBCOMMAND).is_some() {
        cli::server::run().await;
    } else if let Some(upload_matches) = cli.subcommand_matches(cli::UPLOAD_SUBCOMMAND) {
        let uri = required(upload_matches, "uri");
        let file = required(upload_matches, "file");
        let params = FileParams {
            uri: uri.clone(),
            file: file.clone(),
        };
        cli::client::upload_single_file(params).await;
    } else if let Some(list_matches) = cli.subcommand_matches(cli::LIST_SUBCOMMAND) {
        let uri = required(list_matches, "uri");
        cli::client::list_files(uri).await;
    } else if let Some(info_matches) = cli.subcommand_matches(cli::INFO_SUBCOMMAND) {
        let uri = required(info_matches, "uri");
        if let Some(id) = file_id(info_matches) {
            cli::client::file_info(uri, id).await;
        }
    } else if let Some(download_matches) = cli.subcommand_matches(cli::DOWNLOAD_SUBCOMMAND) {
        let uri = required(download_matches, "uri");
        let output = download_matches.get_one::<String>("output");
        if let Some(id) = file_id(download_matches) {
            cli::client::download_file(uri, id, output.map(String::as_str)).await;
        }
    } else if let Some(delete_matches) = cli.subcommand_matches(cli::DELETE_SUBCOMMAND) {
        let uri = required(delete_matches, "uri");
        if let Some(id) = file_id(delete_matches) {
            cli::client::delete_file(uri, id).await;
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a String {
    matches
        .get_one::<String>(name)
        .expect("required argument is enforced by clap")
}

fn file_id(matches: &ArgMatches) -> Option<i64> {
    let raw = required(matches, "id");
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            println!("invalid file id: {raw}");
            None
        }
    }
}
