/// Word-window chunker.
///
/// Sizes are counted in whitespace-separated words. Windows never span two
/// pages; consecutive windows within a page share `overlap` words.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// `overlap` is clamped below `size`.
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size - 1),
        }
    }

    pub fn split_page(&self, page: &str) -> Vec<String> {
        let words: Vec<&str> = page.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += step;
        }

        chunks
    }

    pub fn split_pages(&self, pages: &[String]) -> Vec<String> {
        pages.iter().flat_map(|p| self.split_page(p)).collect()
    }
}
