//! Part boundary planning

/// One contiguous byte range of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// 1-based part number.
    pub number: u32,
    pub start: u64,
    /// Exclusive end offset.
    pub end: u64,
}

impl Part {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `[0, file_size)` into parts of `chunk_size` bytes; only the last may be shorter.
pub fn plan_parts(file_size: u64, chunk_size: u64) -> Vec<Part> {
    assert!(chunk_size > 0, "chunk size must be positive");

    let mut parts = Vec::with_capacity(file_size.div_ceil(chunk_size) as usize);
    let mut number = 1;
    let mut position = 0;

    while position < file_size {
        let end = std::cmp::min(position + chunk_size, file_size);
        parts.push(Part {
            number,
            start: position,
            end,
        });
        number += 1;
        position = end;
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(parts: &[Part], file_size: u64, chunk_size: u64) {
        let mut cursor = 0;
        for (idx, part) in parts.iter().enumerate() {
            assert_eq!(part.number as usize, idx + 1);
            assert_eq!(part.start, cursor);
            assert!(part.len() > 0 && part.len() <= chunk_size);
            if idx + 1 < parts.len() {
                assert_eq!(part.len(), chunk_size);
            }
            cursor = part.end;
        }
        assert_eq!(cursor, file_size);
    }

    #[test]
    fn empty_file_has_no_parts() {
        assert!(plan_parts(0, 10).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let parts = plan_parts(120_000_000, 10_000_000);
        assert_eq!(parts.len(), 12);
        assert_eq!(parts.last().map(Part::len), Some(10_000_000));
        assert_well_formed(&parts, 120_000_000, 10_000_000);
    }

    #[test]
    fn remainder_becomes_last_part() {
        let parts = plan_parts(25, 10);
        assert_eq!(
            parts,
            vec![
                Part { number: 1, start: 0, end: 10 },
                Part { number: 2, start: 10, end: 20 },
                Part { number: 3, start: 20, end: 25 },
            ]
        );
    }

    #[test]
    fn file_smaller_than_chunk_is_one_part() {
        let parts = plan_parts(7, 10);
        assert_eq!(parts, vec![Part { number: 1, start: 0, end: 7 }]);
    }

    #[test]
    fn parts_cover_file_for_many_sizes() {
        for chunk_size in [1, 3, 7, 64, 1000] {
            for file_size in 0..300 {
                let parts = plan_parts(file_size, chunk_size);
                assert_eq!(parts.len() as u64, file_size.div_ceil(chunk_size));
                assert_well_formed(&parts, file_size, chunk_size);
            }
        }
    }
}
