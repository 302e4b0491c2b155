use clap::{Arg, ArgAction, Command};

fn verbose() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Debug mode")
}

fn threads() -> Arg {
    Arg::new("threads")
        .short('t')
        .long("threads")
        .default_value("1")
        .help("number of threads")
}

fn subcommand_assemble() -> Command {
    Command::new("assemble")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Assemble breakend contigs from coordinate-sorted evidence (JSON lines).")
        .arg(verbose())
        .arg(
            Arg::new("reference")
                .short('r')
                .long("reference")
                .value_name("FASTA")
                .required(true)
                .help("Reference genome."),
        )
        .arg(
            Arg::new("evidence")
                .short('e')
                .long("evidence")
                .value_name("JSONL")
                .required(true)
                .help("Soft clips and read pairs sorted by reference and start position."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("JSONL")
                .required(true)
                .help("Assemblies, in the order they were completed."),
        )
        .arg(
            Arg::new("k")
                .short('k')
                .long("k")
                .default_value("25")
                .help("K-mer size. At most 32."),
        )
        .arg(
            Arg::new("min_weight")
                .long("min_weight")
                .default_value("1")
                .help("Contigs lighter than this are discarded."),
        )
        .arg(
            Arg::new("margin")
                .long("margin")
                .default_value("50")
                .help("Positional tolerance and flush margin of the k-mer graph."),
        )
        .arg(
            Arg::new("max_fragment")
                .long("max_fragment")
                .default_value("300")
                .help("Largest fragment size of the library."),
        )
        .arg(
            Arg::new("sanity_check")
                .long("sanity_check")
                .action(ArgAction::SetTrue)
                .help("Verify the graph after every evidence and every contig against the reference. Slow."),
        )
        .arg(
            Arg::new("diagnostics")
                .long("diagnostics")
                .value_name("DIR")
                .help("Dump graphs and per-subgraph metrics to this directory."),
        )
}

fn subcommand_export_realign() -> Command {
    Command::new("export_realign")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Write breakend sequences as FASTQ for an external aligner.")
        .arg(verbose())
        .arg(
            Arg::new("assemblies")
                .short('a')
                .long("assemblies")
                .value_name("JSONL")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FASTQ")
                .required(true),
        )
        .arg(
            Arg::new("min_length")
                .long("min_length")
                .default_value("20")
                .help("Breakend sequences shorter than this are not exported."),
        )
}

fn subcommand_annotate() -> Command {
    Command::new("annotate")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Attach realignments of breakend sequences to their assemblies.")
        .arg(verbose())
        .arg(threads())
        .arg(
            Arg::new("assemblies")
                .short('a')
                .long("assemblies")
                .value_name("JSONL")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("JSONL")
                .required(true),
        )
        .arg(
            Arg::new("realigned")
                .long("realigned")
                .value_name("JSONL")
                .conflicts_with("reference")
                .required_unless_present("reference")
                .help("Records of an external aligner, in the order of the exported FASTQ."),
        )
        .arg(
            Arg::new("expected")
                .long("expected")
                .action(ArgAction::SetTrue)
                .requires("realigned")
                .help("Every exported sequence must have a record."),
        )
        .arg(
            Arg::new("reference")
                .short('r')
                .long("reference")
                .value_name("FASTA")
                .help("Realign breakend sequences in-process against this reference."),
        )
        .arg(
            Arg::new("min_length")
                .long("min_length")
                .default_value("20")
                .help("Breakend sequences shorter than this are not realigned."),
        )
        .arg(
            Arg::new("portable")
                .long("portable")
                .action(ArgAction::SetTrue)
                .help("Do not use the native aligner."),
        )
}

fn subcommand_sort() -> Command {
    Command::new("sort")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Sort assemblies by coordinate and by mate coordinate.")
        .arg(verbose())
        .arg(threads())
        .arg(
            Arg::new("assemblies")
                .short('a')
                .long("assemblies")
                .value_name("JSONL")
                .required(true),
        )
        .arg(
            Arg::new("reference")
                .short('r')
                .long("reference")
                .value_name("FASTA")
                .required(true),
        )
        .arg(
            Arg::new("out_dir")
                .short('o')
                .long("out_dir")
                .value_name("DIR")
                .required(true),
        )
        .arg(
            Arg::new("per_reference")
                .long("per_reference")
                .action(ArgAction::SetTrue)
                .help("One pair of sorted files per reference sequence."),
        )
}

fn subcommand_pipeline() -> Command {
    Command::new("pipeline")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Run pipeline based on the given TOML file.")
        .arg(
            Arg::new("profile")
                .short('p')
                .long("profile")
                .required(true)
                .help("TOML configuration file."),
        )
}

pub fn svasm_parser() -> Command {
    Command::new("svasm")
        .version("0.1")
        .author("Bansho Masutani <ban-m@g.ecc.u-tokyo.ac.jp>")
        .about("Breakend assembler for structural variant calling")
        .arg_required_else_help(true)
        .subcommand(subcommand_assemble())
        .subcommand(subcommand_export_realign())
        .subcommand(subcommand_annotate())
        .subcommand(subcommand_sort())
        .subcommand(subcommand_pipeline())
}
