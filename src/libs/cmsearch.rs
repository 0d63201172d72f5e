use crate::libs::error::Error;
use crate::libs::hit::Hit;
use crate::libs::refine::{AttcSearch, SearchStrand};
use crate::libs::replicon::{Replicon, Window};
use crate::libs::tblout::read_cmsearch;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Reporting threshold passed to cmsearch; hits are filtered again on read
const REPORT_EVALUE: &str = "10";

/// Infernal's `cmsearch --max` run on one window at a time
#[derive(Debug, Clone)]
pub struct CmSearch {
    program: PathBuf,
    model: PathBuf,
    cpu: usize,
    max_evalue: f64,
}

impl CmSearch {
    /// `program` is a name looked up in `PATH` or a path to the executable
    pub fn new(program: &str, model: &str, cpu: usize, max_evalue: f64) -> Result<Self, Error> {
        let program = which::which(program).map_err(|_| Error::MissingTool(program.to_string()))?;
        let model = PathBuf::from(model);
        if !model.is_file() {
            return Err(Error::io(
                std::io::Error::new(std::io::ErrorKind::NotFound, "no attC model"),
                model,
            ));
        }

        Ok(Self {
            program,
            model,
            cpu,
            max_evalue,
        })
    }

    fn args(&self, replicon: &Replicon, strand: SearchStrand, fasta: &Path, dir: &Path) -> Vec<String> {
        // search space of the whole replicon, in Mb
        let mut args = vec![
            "-Z".to_string(),
            format!("{}", replicon.len() as f64 / 1e6),
        ];
        match strand {
            SearchStrand::Top => args.push("--toponly".to_string()),
            SearchStrand::Bottom => args.push("--bottomonly".to_string()),
            SearchStrand::Both => {}
        }
        args.push("--max".to_string());
        args.push("--cpu".to_string());
        args.push(self.cpu.to_string());
        args.push("-o".to_string());
        args.push(dir.join("window.res").to_string_lossy().to_string());
        args.push("--tblout".to_string());
        args.push(dir.join("window.tbl").to_string_lossy().to_string());
        args.push("-E".to_string());
        args.push(REPORT_EVALUE.to_string());
        args.push(self.model.to_string_lossy().to_string());
        args.push(fasta.to_string_lossy().to_string());
        args
    }
}

impl AttcSearch for CmSearch {
    fn search(
        &mut self,
        replicon: &Replicon,
        window: &Window,
        strand: SearchStrand,
    ) -> Result<Vec<Hit>, Error> {
        let failed = |reason: String| Error::Search {
            window: window.to_string(),
            reason,
        };

        let seq = replicon.subseq(window)?;
        let dir = tempfile::Builder::new().prefix("integron").tempdir()?;

        let fasta = dir.path().join("window.fa");
        let definition = noodles_fasta::record::Definition::new(
            format!("{}:{}", replicon.name(), window),
            None,
        );
        let record =
            noodles_fasta::Record::new(definition, noodles_fasta::record::Sequence::from(seq));
        let mut buf = vec![];
        noodles_fasta::io::Writer::new(&mut buf)
            .write_record(&record)
            .map_err(|e| Error::io(e, &fasta))?;
        std::fs::write(&fasta, &buf).map_err(|e| Error::io(e, &fasta))?;

        let args = self.args(replicon, strand, &fasta, dir.path());
        debug!("{} {}", self.program.display(), args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| failed(format!("can't run {}: {}", self.program.display(), e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let tbl = dir.path().join("window.tbl");
        let file = std::fs::File::open(&tbl).map_err(|e| Error::io(e, &tbl))?;
        read_cmsearch(std::io::BufReader::new(file), self.max_evalue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::hit::Topology;

    fn engine(program: &str) -> CmSearch {
        CmSearch {
            program: PathBuf::from(program),
            model: PathBuf::from("attc_4.cm"),
            cpu: 2,
            max_evalue: 1.0,
        }
    }

    #[test]
    fn command_line_per_strand() {
        let rep = Replicon::new("chr", 2_500_000, Topology::Circular, 4000);
        let cm = engine("cmsearch");
        let dir = Path::new("/tmp/w");

        let args = cm.args(&rep, SearchStrand::Top, Path::new("/tmp/w/window.fa"), dir);
        assert_eq!(&args[..5], &["-Z", "2.5", "--toponly", "--max", "--cpu"]);
        assert_eq!(args[5], "2");
        assert_eq!(&args[args.len() - 2..], &["attc_4.cm", "/tmp/w/window.fa"]);
        assert!(args.contains(&"/tmp/w/window.tbl".to_string()));

        let args = cm.args(&rep, SearchStrand::Bottom, Path::new("w.fa"), dir);
        assert_eq!(args[2], "--bottomonly");
        let args = cm.args(&rep, SearchStrand::Both, Path::new("w.fa"), dir);
        assert_eq!(args[2], "--max");
    }

    #[test]
    fn missing_program() {
        let err = CmSearch::new("no-such-cmsearch-here", "attc_4.cm", 1, 1.0).unwrap_err();
        assert!(matches!(err, Error::MissingTool(_)));
    }

    #[test]
    fn failed_run_is_a_search_error() {
        let rep = Replicon::new("chr", 10, Topology::Linear, 1).with_sequence(b"ACGTACGTAC");
        let mut cm = engine("/nonexistent/bin/cmsearch");
        let err = cm
            .search(&rep, &Window::new(0, 10), SearchStrand::Both)
            .unwrap_err();
        assert!(matches!(err, Error::Search { .. }));
    }
}
