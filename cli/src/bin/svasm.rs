use breakend_assembler::{AssemblyConfig, ProcessingConfig};
use std::path::{Path, PathBuf};
use svasm_cli::pipeline;
#[macro_use]
extern crate log;

fn main() -> std::io::Result<()> {
    let matches = svasm_cli::commands::svasm_parser().get_matches();
    if let Some(("pipeline", sub_m)) = matches.subcommand() {
        let path: &String = sub_m.get_one("profile").unwrap();
        use std::io::Read;
        let mut rdr = std::fs::File::open(path).map(std::io::BufReader::new)?;
        let mut file = String::new();
        rdr.read_to_string(&mut file)?;
        let config: pipeline::PipelineConfig =
            toml::from_str(&file).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        return pipeline::run_pipeline(&config).map_err(|why| {
            error!("{}", why);
            why.into()
        });
    }
    if let Some((_, sub_m)) = matches.subcommand() {
        let level = match sub_m.get_count("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }
    let result = match matches.subcommand() {
        Some(("assemble", sub_m)) => assemble(sub_m),
        Some(("export_realign", sub_m)) => export_realign(sub_m),
        Some(("annotate", sub_m)) => annotate(sub_m),
        Some(("sort", sub_m)) => sort(sub_m),
        _ => unreachable!(),
    };
    result.map_err(|why| {
        error!("{}", why);
        why.into()
    })
}

type Result<T> = std::result::Result<T, breakend_assembler::AssemblyError>;

fn path(matches: &clap::ArgMatches, name: &str) -> PathBuf {
    let path: &String = matches.get_one(name).unwrap();
    PathBuf::from(path)
}

fn parse<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Result<T> {
    let value: &String = matches.get_one(name).unwrap();
    value
        .parse()
        .map_err(|_| breakend_assembler::AssemblyError::config(name, format!("{} is not a valid value", value)))
}

fn assemble(matches: &clap::ArgMatches) -> Result<()> {
    let assembly = AssemblyConfig::new(
        parse(matches, "k")?,
        parse(matches, "min_weight")?,
        parse(matches, "margin")?,
        parse(matches, "max_fragment")?,
    );
    let mut config = ProcessingConfig::new(assembly);
    config.sanity_check_graph = matches.get_flag("sanity_check");
    config.sanity_check_contigs = matches.get_flag("sanity_check");
    config.diagnostics = matches.get_one::<String>("diagnostics").map(PathBuf::from);
    config.validate()?;
    let reference = pipeline::load_reference(&path(matches, "reference"))?;
    let evidence = path(matches, "evidence");
    pipeline::assemble(&reference, &evidence, &path(matches, "output"), &config)?;
    Ok(())
}

fn export_realign(matches: &clap::ArgMatches) -> Result<()> {
    let min_length = parse(matches, "min_length")?;
    let assemblies = path(matches, "assemblies");
    pipeline::export_realign(&assemblies, &path(matches, "output"), min_length)?;
    Ok(())
}

fn annotate(matches: &clap::ArgMatches) -> Result<()> {
    set_threads(matches);
    let min_length = parse(matches, "min_length")?;
    let assemblies = path(matches, "assemblies");
    let output = path(matches, "output");
    match matches.get_one::<String>("realigned") {
        Some(realigned) => {
            let expected = matches.get_flag("expected");
            pipeline::annotate(&assemblies, Path::new(realigned), &output, min_length, expected)
        }
        None => {
            let mut config = ProcessingConfig::default();
            config.min_realign_length = min_length;
            config.native_aligner = !matches.get_flag("portable");
            let reference = pipeline::load_reference(&path(matches, "reference"))?;
            pipeline::realign(&reference, &assemblies, &output, &config)
        }
    }
}

fn sort(matches: &clap::ArgMatches) -> Result<()> {
    let mut config = ProcessingConfig::default();
    config.threads = parse(matches, "threads")?;
    config.per_reference_output = matches.get_flag("per_reference");
    config.validate()?;
    let reference = pipeline::load_reference(&path(matches, "reference"))?;
    let outputs = pipeline::sort(&reference, &path(matches, "assemblies"), &path(matches, "out_dir"), &config)?;
    for output in outputs {
        info!("Wrote\t{}", output.display());
    }
    Ok(())
}

fn set_threads(matches: &clap::ArgMatches) {
    if let Some(threads) = matches
        .get_one("threads")
        .and_then(|num: &String| num.parse().ok())
    {
        debug!("Set Threads\t{}", threads);
        if let Err(why) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            debug!("{:?}", why);
        }
    }
}
