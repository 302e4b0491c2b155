//! Sorted persistence of assemblies.
//!
//! Assemblies are first written, unsorted, into one primary and one mate-coordinate file per reference
//! (or one of each for the whole genome), then every file is sorted by its own task and renamed into place.
use crate::config::ProcessingConfig;
use crate::error::AssemblyError;
use crate::reference::ReferenceLookup;
use definitions::AssemblyEvidence;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Primary,
    Mate,
}

impl Stream {
    fn tag(&self) -> &'static str {
        match self {
            Stream::Primary => "assembly",
            Stream::Mate => "assembly.mate",
        }
    }
    fn key(&self, assembly: &AssemblyEvidence) -> (usize, usize) {
        match self {
            Stream::Primary => (assembly.reference_index, assembly.alignment_start),
            Stream::Mate => assembly.mate_coordinate(),
        }
    }
}

/// Files created by one persist call. Temporary files are always removed, outputs only
/// when the call did not complete. Removal runs in reverse creation order.
#[derive(Debug, Default)]
struct FileGuard {
    temporary: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    completed: bool,
}

impl FileGuard {
    fn temporary(&mut self, path: PathBuf) -> PathBuf {
        self.temporary.push(path.clone());
        path
    }
    fn output(&mut self, path: PathBuf) -> PathBuf {
        self.outputs.push(path.clone());
        path
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if !self.completed {
            for path in self.outputs.iter().rev() {
                if path.is_file() {
                    if let Err(why) = std::fs::remove_file(path) {
                        warn!("CLEANUP\t{:?}\t{}", path, why);
                    }
                }
            }
        }
        for path in self.temporary.iter().rev() {
            if path.is_file() {
                if let Err(why) = std::fs::remove_file(path) {
                    warn!("CLEANUP\t{:?}\t{}", path, why);
                }
            }
        }
    }
}

const STREAMS: [Stream; 2] = [Stream::Primary, Stream::Mate];

type Writers = BTreeMap<(usize, Option<usize>), BufWriter<File>>;

struct SortTask {
    stream: Stream,
    unsorted: PathBuf,
    working: PathBuf,
    output: PathBuf,
}

pub struct AssemblySink<'a, R: ReferenceLookup + ?Sized> {
    out_dir: PathBuf,
    reference: &'a R,
    per_reference: bool,
    threads: usize,
}

impl<'a, R: ReferenceLookup + ?Sized> AssemblySink<'a, R> {
    pub fn new(out_dir: &Path, reference: &'a R, config: &ProcessingConfig) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            reference,
            per_reference: config.per_reference_output,
            threads: config.threads.max(1),
        }
    }
    fn group_name(&self, group: Option<usize>) -> Option<String> {
        group.map(|ri| match self.reference.name(ri) {
            Some(name) => name.to_string(),
            None => ri.to_string(),
        })
    }
    fn path(&self, stream: Stream, group: Option<usize>, suffix: &str) -> PathBuf {
        let name = match self.group_name(group) {
            Some(name) => format!("{}.{}.{}", stream.tag(), name, suffix),
            None => format!("{}.{}", stream.tag(), suffix),
        };
        self.out_dir.join(name)
    }
    /// The genome-wide sorted primary file.
    pub fn primary_path(&self) -> PathBuf {
        self.path(Stream::Primary, None, "sorted.jsonl")
    }
    /// The genome-wide sorted mate-coordinate file, or the one of `reference_index` in per-reference mode.
    pub fn mate_path(&self, reference_index: Option<usize>) -> PathBuf {
        self.path(Stream::Mate, reference_index, "sorted.jsonl")
    }
    pub fn reference_primary_path(&self, reference_index: usize) -> PathBuf {
        self.path(Stream::Primary, Some(reference_index), "sorted.jsonl")
    }
    /// Write and sort every assembly. Returns the paths of the sorted files.
    /// On failure every file created so far is removed.
    pub fn persist<I>(&self, assemblies: I) -> Result<Vec<PathBuf>, AssemblyError>
    where
        I: IntoIterator<Item = AssemblyEvidence>,
    {
        debug!("START\tPersist\t{:?}", self.out_dir);
        let persist = |stage: &str| {
            let stage = stage.to_string();
            move |source: std::io::Error| AssemblyError::Persist { stage, source }
        };
        std::fs::create_dir_all(&self.out_dir).map_err(persist("create output directory"))?;
        let mut guard = FileGuard::default();
        let tasks = self
            .write_unsorted(assemblies, &mut guard)
            .map_err(persist("write assemblies"))?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            .map_err(persist("start sort workers"))?;
        pool.install(|| tasks.par_iter().map(sort_file).collect::<std::io::Result<Vec<_>>>())
            .map_err(persist("sort assemblies"))?;
        let mut outputs: Vec<_> = tasks.iter().map(|t| t.output.clone()).collect();
        if self.per_reference {
            // Tasks are in reference order.
            let references: Vec<_> = tasks
                .iter()
                .filter(|t| t.stream == Stream::Primary)
                .map(|t| t.output.clone())
                .collect();
            let working = guard.temporary(self.path(Stream::Primary, None, "sorted.jsonl.tmp"));
            let output = guard.output(self.primary_path());
            merge_files(&references, &working, &output).map_err(persist("merge sorted assemblies"))?;
            outputs.push(output);
        }
        guard.completed = true;
        debug!("DONE\tPersist\t{}\tFiles", outputs.len());
        Ok(outputs)
    }
    fn write_unsorted<I>(&self, assemblies: I, guard: &mut FileGuard) -> std::io::Result<Vec<SortTask>>
    where
        I: IntoIterator<Item = AssemblyEvidence>,
    {
        // Keyed by (stream, group) so that tasks come out in reference order.
        let mut writers: Writers = BTreeMap::new();
        let mut tasks: BTreeMap<(usize, Option<usize>), SortTask> = BTreeMap::new();
        if !self.per_reference {
            for order in 0..STREAMS.len() {
                self.open((order, None), guard, &mut writers, &mut tasks)?;
            }
        }
        let mut count = 0;
        for assembly in assemblies {
            count += 1;
            for (order, stream) in STREAMS.iter().enumerate() {
                let group = match self.per_reference {
                    true => Some(stream.key(&assembly).0),
                    false => None,
                };
                let key = (order, group);
                if !writers.contains_key(&key) {
                    self.open(key, guard, &mut writers, &mut tasks)?;
                }
                if let Some(wtr) = writers.get_mut(&key) {
                    serde_json::to_writer(&mut *wtr, &assembly)?;
                    writeln!(wtr)?;
                }
            }
        }
        for (_, mut wtr) in writers {
            wtr.flush()?;
        }
        debug!("PERSIST\t{}\tAssemblies\t{}\tFiles", count, tasks.len());
        Ok(tasks.into_iter().map(|(_, task)| task).collect())
    }
    fn open(
        &self,
        key: (usize, Option<usize>),
        guard: &mut FileGuard,
        writers: &mut Writers,
        tasks: &mut BTreeMap<(usize, Option<usize>), SortTask>,
    ) -> std::io::Result<()> {
        let (stream, group) = (STREAMS[key.0], key.1);
        let unsorted = guard.temporary(self.path(stream, group, "unsorted.jsonl"));
        let working = guard.temporary(self.path(stream, group, "sorted.jsonl.tmp"));
        let output = guard.output(self.path(stream, group, "sorted.jsonl"));
        writers.insert(key, File::create(&unsorted).map(BufWriter::new)?);
        let task = SortTask {
            stream,
            unsorted,
            working,
            output,
        };
        tasks.insert(key, task);
        Ok(())
    }
}

fn read_assemblies(path: &Path) -> std::io::Result<Vec<AssemblyEvidence>> {
    let reader = File::open(path).map(BufReader::new)?;
    let mut assemblies = vec![];
    for line in reader.lines() {
        let line = line?;
        if !line.is_empty() {
            assemblies.push(serde_json::from_str(&line)?);
        }
    }
    Ok(assemblies)
}

fn sort_file(task: &SortTask) -> std::io::Result<()> {
    let mut assemblies = read_assemblies(&task.unsorted)?;
    let stream = task.stream;
    assemblies.sort_by(|x, y| {
        stream
            .key(x)
            .cmp(&stream.key(y))
            .then_with(|| x.id.cmp(&y.id))
    });
    let mut wtr = File::create(&task.working).map(BufWriter::new)?;
    for assembly in assemblies.iter() {
        serde_json::to_writer(&mut wtr, assembly)?;
        writeln!(wtr)?;
    }
    wtr.flush()?;
    drop(wtr);
    std::fs::rename(&task.working, &task.output)?;
    trace!("SORTED\t{:?}\t{}", task.output, assemblies.len());
    Ok(())
}

// Inputs are sorted and hold disjoint, increasing references.
fn merge_files(inputs: &[PathBuf], working: &Path, output: &Path) -> std::io::Result<()> {
    let mut wtr = File::create(working).map(BufWriter::new)?;
    for input in inputs {
        let mut reader = File::open(input).map(BufReader::new)?;
        std::io::copy(&mut reader, &mut wtr)?;
    }
    wtr.flush()?;
    drop(wtr);
    std::fs::rename(working, output)
}

/// Read the assemblies of a sorted (or unsorted) JSON lines file.
pub fn load_assemblies(path: &Path) -> Result<Vec<AssemblyEvidence>, AssemblyError> {
    Ok(read_assemblies(path)?)
}
