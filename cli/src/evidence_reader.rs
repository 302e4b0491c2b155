//! Buffered reading of evidence (JSON lines) on a dedicated thread.
//! Records are handed over in batches but yielded one at a time, in file order.
use crossbeam_channel::{bounded, Receiver, Sender};
use definitions::Evidence;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread::JoinHandle;

const BATCH_SIZE: usize = 1024;
const CHANNEL_CAPACITY: usize = 4;

type Batch = std::io::Result<Vec<Evidence>>;

pub struct EvidenceReader {
    receiver: Receiver<Batch>,
    handle: Option<JoinHandle<()>>,
    batch: std::vec::IntoIter<Evidence>,
}

fn reader_thread<R: BufRead>(reader: R, sender: Sender<Batch>) {
    let mut batch = Vec::with_capacity(BATCH_SIZE);
    for (i, line) in reader.lines().enumerate() {
        let parsed = line.and_then(|line| match line.trim().is_empty() {
            true => Ok(None),
            false => serde_json::from_str(&line).map(Some).map_err(|why| {
                let message = format!("line {}: {}", i + 1, why);
                std::io::Error::new(std::io::ErrorKind::InvalidData, message)
            }),
        });
        match parsed {
            Ok(Some(evidence)) => batch.push(evidence),
            Ok(None) => {}
            Err(why) => {
                if !batch.is_empty() && sender.send(Ok(batch)).is_err() {
                    return;
                }
                let _ = sender.send(Err(why));
                return;
            }
        }
        if BATCH_SIZE <= batch.len() {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(BATCH_SIZE));
            if sender.send(Ok(full)).is_err() {
                return;
            }
        }
    }
    if !batch.is_empty() {
        let _ = sender.send(Ok(batch));
    }
}

impl EvidenceReader {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let reader = std::fs::File::open(path).map(BufReader::new)?;
        debug!("Opening {:?}", path);
        Ok(Self::from_reader(reader))
    }
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        let handle = std::thread::spawn(move || reader_thread(reader, sender));
        Self {
            receiver,
            handle: Some(handle),
            batch: Vec::new().into_iter(),
        }
    }
}

impl Iterator for EvidenceReader {
    type Item = std::io::Result<Evidence>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(evidence) = self.batch.next() {
                return Some(Ok(evidence));
            }
            match self.receiver.recv() {
                Ok(Ok(batch)) => self.batch = batch.into_iter(),
                Ok(Err(why)) => return Some(Err(why)),
                Err(_) => {
                    if let Some(handle) = self.handle.take() {
                        if handle.join().is_err() {
                            error!("The evidence reader thread panicked");
                        }
                    }
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use definitions::BreakendDirection;
    #[test]
    fn reads_in_order() {
        let evidence: Vec<_> = (0..3000)
            .map(|i| Evidence::soft_clip(&format!("r{}", i), 0, BreakendDirection::Forward, i + 1, 3, "ACGTT"))
            .collect();
        let mut input = String::new();
        for e in evidence.iter() {
            input.push_str(&serde_json::to_string(e).unwrap());
            input.push('\n');
        }
        input.push('\n');
        let reader = EvidenceReader::from_reader(std::io::Cursor::new(input.into_bytes()));
        let read: Vec<_> = reader.collect::<std::io::Result<_>>().unwrap();
        assert_eq!(read, evidence);
    }
    #[test]
    fn malformed_line() {
        let e = Evidence::soft_clip("r1", 0, BreakendDirection::Forward, 1, 3, "ACGTT");
        let input = format!("{}\nnot json\n", serde_json::to_string(&e).unwrap());
        let mut reader = EvidenceReader::from_reader(std::io::Cursor::new(input.into_bytes()));
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
        assert!(reader.next().is_none());
    }
}
