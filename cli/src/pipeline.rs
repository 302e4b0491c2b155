//! Pipelines -- the stages of breakend assembly, from sorted evidence to sorted assemblies.
//!
//! Every stage reads the output of the previous one from a file, so each of them can also be run on its own.
use crate::evidence_reader::EvidenceReader;
use breakend_assembler::alignment::create_aligner;
use breakend_assembler::annotate::{attach_realignments, realign_breakends};
use breakend_assembler::realign::{read_realigned_records, realignment_order, write_realignment_fastq};
use breakend_assembler::sink::{load_assemblies, AssemblySink};
use breakend_assembler::{AssemblyConfig, AssemblyError, DeBruijnSubgraphAssembler, InMemoryReference, ProcessingConfig};
use definitions::AssemblyEvidence;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// The configuration of the pipeline.
/// This struct is a comprehensive list of the parameters that can be set by a user.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PipelineConfig {
    /// The path to the reference genome (FASTA).
    reference: PathBuf,
    /// Coordinate-sorted evidence (JSON lines).
    evidence: PathBuf,
    /// The path to the output directory.
    out_dir: PathBuf,
    prefix: String,
    verbose: usize,
    threads: usize,
    kmersize: usize,
    min_weight: u64,
    margin: usize,
    max_fragment: usize,
    #[serde(default)]
    max_indel: Option<usize>,
    min_realign_length: usize,
    #[serde(default)]
    per_reference: bool,
    #[serde(default)]
    portable_aligner: bool,
    #[serde(default)]
    sanity_check: bool,
    #[serde(default)]
    diagnostics: Option<PathBuf>,
    #[serde(default)]
    resume: bool,
}

impl PipelineConfig {
    pub fn verbose(&self) -> usize {
        self.verbose
    }
    pub fn processing_config(&self) -> ProcessingConfig {
        let mut assembly = AssemblyConfig::new(self.kmersize, self.min_weight, self.margin, self.max_fragment);
        if let Some(max_indel) = self.max_indel {
            assembly.max_indel_size = max_indel;
        }
        let mut config = ProcessingConfig::new(assembly);
        config.sanity_check_graph = self.sanity_check;
        config.sanity_check_contigs = self.sanity_check;
        config.native_aligner = !self.portable_aligner;
        config.min_realign_length = self.min_realign_length;
        config.per_reference_output = self.per_reference;
        config.threads = self.threads;
        config.diagnostics = self.diagnostics.clone();
        config
    }
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<(), AssemblyError> {
    let PipelineConfig {
        reference,
        evidence,
        out_dir,
        prefix,
        verbose,
        threads,
        resume,
        ..
    } = config.clone();
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    let processing = config.processing_config();
    processing.validate()?;
    if let Err(why) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        debug!("{:?}", why);
    }
    std::fs::create_dir_all(&out_dir)?;
    let file_stem = out_dir.join(prefix);
    let assembled = file_stem.with_extension("assembly.jsonl");
    let realigned = file_stem.with_extension("realigned.jsonl");
    let fastq = file_stem.with_extension("breakend.fq");
    let sorted = file_stem.with_extension("sorted");
    let reference = load_reference(&reference)?;
    // Pipeline.
    if resume && matches!(assembled.try_exists(), Ok(true)) {
        debug!("RESUME\t{:?}", assembled);
    } else {
        require("Evidence collection", &evidence)?;
        assemble(&reference, &evidence, &assembled, &processing)?;
    }
    if resume && matches!(realigned.try_exists(), Ok(true)) {
        debug!("RESUME\t{:?}", realigned);
    } else {
        require("Assembly", &assembled)?;
        realign(&reference, &assembled, &realigned, &processing)?;
    }
    require("Breakend realignment", &realigned)?;
    export_realign(&realigned, &fastq, processing.min_realign_length)?;
    sort(&reference, &realigned, &sorted, &processing)?;
    Ok(())
}

/// Fail unless the output of `stage` is present.
pub fn require(stage: &str, path: &Path) -> Result<(), AssemblyError> {
    match path.try_exists() {
        Ok(true) => Ok(()),
        _ => Err(AssemblyError::Prerequisite {
            stage: stage.to_string(),
            path: path.display().to_string(),
        }),
    }
}

pub fn load_reference(path: &Path) -> Result<InMemoryReference, AssemblyError> {
    require("Reference indexing", path)?;
    debug!("Opening {:?}", path);
    let reader = std::fs::File::open(path).map(BufReader::new)?;
    Ok(InMemoryReference::from_fasta(reader)?)
}

fn log(assemblies: &[AssemblyEvidence], path: &Path) -> Result<(), AssemblyError> {
    let mut wtr = std::fs::File::create(path).map(BufWriter::new)?;
    for assembly in assemblies {
        serde_json::to_writer(&mut wtr, assembly)?;
        writeln!(wtr)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Assemble every evidence of `evidence` into `output`. Returns the number of assemblies.
pub fn assemble(
    reference: &InMemoryReference,
    evidence: &Path,
    output: &Path,
    config: &ProcessingConfig,
) -> Result<usize, AssemblyError> {
    debug!("START\tAssembly");
    let mut assembler = DeBruijnSubgraphAssembler::new(config, reference)?;
    let mut wtr = std::fs::File::create(output).map(BufWriter::new)?;
    let mut count = 0;
    let mut write = |assemblies: Vec<AssemblyEvidence>| -> Result<(), AssemblyError> {
        for assembly in assemblies {
            serde_json::to_writer(&mut wtr, &assembly)?;
            writeln!(wtr)?;
            count += 1;
        }
        Ok(())
    };
    for record in EvidenceReader::open(evidence)? {
        write(assembler.add_evidence(&record?)?)?;
    }
    write(assembler.end_of_evidence()?)?;
    drop(write);
    wtr.flush()?;
    info!("Assembly\t{}\tSubgraphs\t{}\tAssemblies", assembler.subgraphs_closed(), count);
    debug!("DONE\tAssembly");
    Ok(count)
}

/// Realign breakend sequences in-process.
pub fn realign(
    reference: &InMemoryReference,
    assemblies: &Path,
    output: &Path,
    config: &ProcessingConfig,
) -> Result<(), AssemblyError> {
    debug!("START\tRealignment");
    let mut assemblies = load_assemblies(assemblies)?;
    realignment_order(&mut assemblies);
    let aligner = create_aligner(config);
    let mapped = realign_breakends(&mut assemblies, reference, aligner.as_ref(), config);
    info!("Realignment\t{}\tAssemblies\t{}\tMapped", assemblies.len(), mapped);
    log(&assemblies, output)?;
    debug!("DONE\tRealignment");
    Ok(())
}

/// Write breakend sequences for an external aligner.
pub fn export_realign(assemblies: &Path, output: &Path, min_length: usize) -> Result<usize, AssemblyError> {
    let mut assemblies = load_assemblies(assemblies)?;
    realignment_order(&mut assemblies);
    let mut wtr = std::fs::File::create(output).map(BufWriter::new)?;
    let exported = write_realignment_fastq(&assemblies, min_length, &mut wtr)?;
    wtr.flush()?;
    info!("Export\t{}\tSequences", exported);
    Ok(exported)
}

/// Attach the records of an external aligner.
pub fn annotate(
    assemblies: &Path,
    realigned: &Path,
    output: &Path,
    min_length: usize,
    expected: bool,
) -> Result<(), AssemblyError> {
    require("Breakend realignment", realigned)?;
    let assemblies = load_assemblies(assemblies)?;
    let reader = std::fs::File::open(realigned).map(BufReader::new)?;
    let annotated = attach_realignments(assemblies, read_realigned_records(reader), min_length, expected)?;
    log(&annotated, output)
}

pub fn sort(
    reference: &InMemoryReference,
    assemblies: &Path,
    out_dir: &Path,
    config: &ProcessingConfig,
) -> Result<Vec<PathBuf>, AssemblyError> {
    debug!("START\tSort");
    let assemblies = load_assemblies(assemblies)?;
    let sink = AssemblySink::new(out_dir, reference, config);
    let outputs = sink.persist(assemblies)?;
    debug!("DONE\tSort");
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use definitions::{BreakendDirection, Evidence, RealignedRecord};
    const PROFILE: &str = r#"
reference = "ref.fa"
evidence = "evidence.jsonl"
out_dir = "out"
prefix = "sample"
verbose = 1
threads = 2
kmersize = 5
min_weight = 2
margin = 20
max_fragment = 400
min_realign_length = 10
"#;
    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("svasm_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
    #[test]
    fn profile() {
        let config: PipelineConfig = toml::from_str(PROFILE).unwrap();
        assert_eq!(config.verbose(), 1);
        let processing = config.processing_config();
        assert_eq!(processing.assembly.k, 5);
        assert_eq!(processing.assembly.min_path_weight, 2);
        assert_eq!(processing.assembly.max_fragment_size, 400);
        assert_eq!(processing.assembly.max_indel_size, 100);
        assert_eq!(processing.threads, 2);
        assert!(processing.native_aligner);
        assert!(!processing.per_reference_output);
    }
    #[test]
    fn missing_prerequisite() {
        let dir = temp_dir("prerequisite");
        let missing = dir.join("nothing.jsonl");
        match require("Assembly", &missing) {
            Err(AssemblyError::Prerequisite { stage, .. }) => assert_eq!(stage, "Assembly"),
            x => panic!("{:?}", x),
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn stages() {
        let dir = temp_dir("stages");
        let fasta = dir.join("ref.fa");
        std::fs::write(&fasta, ">chr1\nTAAACCCCGGGGTTTTACGT\n").unwrap();
        let evidence = dir.join("evidence.jsonl");
        let records = [
            Evidence::soft_clip("a1", 0, BreakendDirection::Forward, 1, 4, "TAAAGTC"),
            Evidence::soft_clip("a2", 0, BreakendDirection::Forward, 2, 3, "AAAGTCT"),
        ];
        let lines: Vec<_> = records.iter().map(|e| serde_json::to_string(e).unwrap()).collect();
        std::fs::write(&evidence, lines.join("\n")).unwrap();
        let reference = load_reference(&fasta).unwrap();
        let mut config = ProcessingConfig::new(AssemblyConfig::new(3, 1, 10, 300));
        config.min_realign_length = 4;
        config.native_aligner = false;
        let assembled = dir.join("sample.assembly.jsonl");
        assert_eq!(assemble(&reference, &evidence, &assembled, &config).unwrap(), 1);
        let realigned = dir.join("sample.realigned.jsonl");
        realign(&reference, &assembled, &realigned, &config).unwrap();
        let fastq = dir.join("sample.breakend.fq");
        assert_eq!(export_realign(&realigned, &fastq, 4).unwrap(), 1);
        let exported = std::fs::read_to_string(&fastq).unwrap();
        let mut exported = exported.lines();
        let name = exported.next().unwrap().trim_start_matches('@').to_string();
        assert!(name.starts_with("0#") && name.ends_with("#asm0-0"), "{}", name);
        assert_eq!(exported.next(), Some("GTCT"));
        let external = dir.join("sample.external.jsonl");
        let record = serde_json::to_string(&RealignedRecord::unmapped(&name)).unwrap();
        std::fs::write(&external, record).unwrap();
        let annotated = dir.join("sample.annotated.jsonl");
        annotate(&assembled, &external, &annotated, 4, true).unwrap();
        let annotated = load_assemblies(&annotated).unwrap();
        assert_eq!(annotated[0].subsequent_realignments, vec![RealignedRecord::unmapped(&name)]);
        let outputs = sort(&reference, &realigned, &dir.join("sorted"), &config).unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|path| path.is_file()));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
