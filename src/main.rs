use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use quire::build::{build_plan, write_plan, Build};
use quire::config::Config;
use quire::tag::index_by_tag;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let matches = App::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("project")
                .long("project")
                .short("p")
                .value_name("DIR")
                .default_value(".")
                .help("The project directory (or any directory below it)"),
        )
        .arg(
            Arg::with_name("strict")
                .long("strict")
                .help("Fail if any post was dropped or degraded"),
        )
        .subcommand(
            SubCommand::with_name("plan")
                .about("Writes the route plan as YAML")
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .value_name("FILE")
                        .help("Where to write the plan (defaults to stdout)"),
                ),
        )
        .subcommand(SubCommand::with_name("tags").about("Lists every tag and its post count"))
        .get_matches();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let project = matches.value_of("project").unwrap_or(".");
    let config = Config::from_directory(Path::new(project))?;
    let build = build_plan(&config)?;

    if matches.is_present("strict") && !build.index.warnings.is_empty() {
        return Err(format!(
            "{} warning(s) surfaced in strict mode",
            build.index.warnings.len()
        )
        .into());
    }

    match matches.subcommand() {
        ("plan", Some(sub)) => match sub.value_of("output") {
            Some(path) => write_plan(&build.plan, File::create(path)?)?,
            None => write_plan(&build.plan, std::io::stdout())?,
        },
        ("tags", Some(_)) => print_tags(&build),
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

fn print_tags(build: &Build) {
    for (slug, group) in index_by_tag(&build.index.items).iter() {
        println!("{}\t{}\t{}", slug, group.display_name, group.items.len());
    }
}
