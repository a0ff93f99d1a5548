//! CSV 传输统计

use std::path::{Path, PathBuf};

/// 单个文件的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    /// 见到的最大行号
    pub total_lines: usize,
    pub skipped_lines: usize,
    pub published_lines: usize,
    pub failed_lines: usize,
}

/// 按文件登记顺序保存的统计
#[derive(Debug, Default)]
pub struct TransferStats {
    files: Vec<(PathBuf, FileStats)>,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记文件，空文件也会被计入
    pub fn ensure_file(&mut self, file: &Path) {
        self.entry(file);
    }

    pub fn get(&self, file: &Path) -> FileStats {
        self.files
            .iter()
            .find(|(path, _)| path == file)
            .map(|(_, stats)| *stats)
            .unwrap_or_default()
    }

    pub fn update_total_lines(&mut self, file: &Path, line_number: usize) {
        let stats = self.entry(file);
        stats.total_lines = stats.total_lines.max(line_number);
    }

    pub fn increment_skipped(&mut self, file: &Path) {
        self.entry(file).skipped_lines += 1;
    }

    pub fn increment_published(&mut self, file: &Path) {
        self.entry(file).published_lines += 1;
    }

    pub fn increment_failed(&mut self, file: &Path) {
        self.entry(file).failed_lines += 1;
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &FileStats)> {
        self.files.iter().map(|(path, stats)| (path.as_path(), stats))
    }

    pub fn total_lines(&self) -> usize {
        self.sum(|s| s.total_lines)
    }

    pub fn skipped_lines(&self) -> usize {
        self.sum(|s| s.skipped_lines)
    }

    pub fn published_lines(&self) -> usize {
        self.sum(|s| s.published_lines)
    }

    pub fn failed_lines(&self) -> usize {
        self.sum(|s| s.failed_lines)
    }

    fn sum(&self, field: impl Fn(&FileStats) -> usize) -> usize {
        self.files.iter().map(|(_, stats)| field(stats)).sum()
    }

    fn entry(&mut self, file: &Path) -> &mut FileStats {
        let idx = match self.files.iter().position(|(path, _)| path == file) {
            Some(idx) => idx,
            None => {
                self.files.push((file.to_path_buf(), FileStats::default()));
                self.files.len() - 1
            }
        };
        &mut self.files[idx].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_keep_registration_order_and_totals_add_up() {
        let mut stats = TransferStats::new();
        let b = Path::new("b.csv");
        let a = Path::new("a.csv");

        stats.ensure_file(b);
        stats.update_total_lines(b, 3);
        stats.update_total_lines(b, 2);
        stats.increment_skipped(b);
        stats.increment_published(b);
        stats.increment_failed(b);
        stats.ensure_file(a);

        let order: Vec<_> = stats.files().map(|(path, _)| path.to_path_buf()).collect();
        assert_eq!(order, vec![b.to_path_buf(), a.to_path_buf()]);
        assert_eq!(stats.get(b).total_lines, 3);
        assert_eq!(stats.get(a), FileStats::default());
        assert_eq!(stats.file_count(), 2);
        assert_eq!(
            (stats.total_lines(), stats.skipped_lines(), stats.published_lines(), stats.failed_lines()),
            (3, 1, 1, 1)
        );
    }
}
