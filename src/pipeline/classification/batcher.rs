/// Split `values` into consecutive chunks of at most `batch_size`, preserving order.
///
/// A zero batch size is treated as one.
pub fn batches(values: &[String], batch_size: usize) -> impl Iterator<Item = &[String]> {
    values.chunks(batch_size.max(1))
}

/// Number of batches `batches` will yield.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("v{i}")).collect()
    }

    #[test]
    fn every_value_lands_in_exactly_one_batch() {
        let vs = values(32);
        let chunks: Vec<&[String]> = batches(&vs, 15).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![15, 15, 2]);
        let flattened: Vec<String> = chunks.concat();
        assert_eq!(flattened, vs);
    }

    #[test]
    fn exact_multiple_has_no_trailing_batch() {
        let vs = values(20);
        assert_eq!(batches(&vs, 10).count(), 2);
        assert_eq!(batch_count(20, 10), 2);
    }

    #[test]
    fn empty_input_has_no_batches() {
        assert_eq!(batches(&[], 10).count(), 0);
        assert_eq!(batch_count(0, 10), 0);
    }

    #[test]
    fn zero_batch_size_degrades_to_singletons() {
        let vs = values(3);
        assert_eq!(batches(&vs, 0).count(), 3);
        assert_eq!(batch_count(3, 0), 3);
    }
}
