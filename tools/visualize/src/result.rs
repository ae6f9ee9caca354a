//! 运行结果.

use aug_berry::viz::StageOutput;
use aug_berry::SliceAxis;
use std::io::{self, Write};
use std::path::PathBuf;

const SEP: &str = "--------------------------------------------------------";

/// 一次运行的汇总.
#[derive(Debug)]
pub struct RunSummary {
    axis: SliceAxis,
    seed: u64,
    indexes: Vec<usize>,
    stages: Vec<String>,
    files: Vec<PathBuf>,
}

impl RunSummary {
    pub fn new(
        axis: SliceAxis,
        seed: u64,
        indexes: Vec<usize>,
        outputs: &[StageOutput],
        files: Vec<PathBuf>,
    ) -> Self {
        let mut stages: Vec<String> = Vec::new();
        for o in outputs {
            let joined = o.names.join(" -> ");
            if stages.last() != Some(&joined) {
                stages.push(joined);
            }
        }
        Self {
            axis,
            seed,
            indexes,
            stages,
            files,
        }
    }

    /// 将汇总写进 `w` 中.
    fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        const S4: &str = "    ";

        writeln!(w, "{SEP}")?;
        writeln!(w, "Slice axis: {}", self.axis)?;
        writeln!(w, "Seed: {}", self.seed)?;
        writeln!(w, "Slices: {:?}", self.indexes)?;
        writeln!(w, "Stages:")?;
        for (k, stage) in self.stages.iter().enumerate() {
            writeln!(w, "{S4}{}. {stage}", k + 1)?;
        }
        writeln!(w, "Files written: {}", self.files.len())?;
        for f in &self.files {
            writeln!(w, "{S4}{}", f.display())?;
        }
        write!(w, "{SEP}")?;
        Ok(())
    }

    /// 输出汇总.
    pub fn analyze(&self) {
        let mut buf = Vec::with_capacity(512);
        match self.describe_into(&mut buf) {
            Ok(()) => println!("{}", String::from_utf8_lossy(&buf)),
            Err(e) => log::warn!("cannot describe run: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RunSummary;
    use aug_berry::SliceAxis;
    use std::path::PathBuf;

    #[test]
    fn test_describe() {
        let summary = RunSummary::new(
            SliceAxis::Axial,
            7,
            vec![3, 9],
            &[],
            vec![PathBuf::from("out/Flip_slice3.png")],
        );
        let mut buf = Vec::new();
        summary.describe_into(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Slice axis: axial"));
        assert!(text.contains("Slices: [3, 9]"));
        assert!(text.contains("out/Flip_slice3.png"));
    }
}
