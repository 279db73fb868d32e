use memchr::memmem;

/// A signature occurrence inside the payload. `end` is one past the final
/// byte of the match, which is where the matching parser expects the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub end: usize,
    pub signature: usize,
}

/// Finds every occurrence of every signature within `data[..limit]` and
/// returns them ordered by position. Ties at the same position are broken by
/// signature registration order, which keeps dispatch deterministic.
pub fn scan(data: &[u8], signatures: &[&[u8]], limit: usize) -> Vec<Match> {
    let window = &data[..limit.min(data.len())];
    let mut matches = Vec::new();
    for (i, sig) in signatures.iter().enumerate() {
        let finder = memmem::Finder::new(sig);
        for start in finder.find_iter(window) {
            matches.push(Match {
                end: start + sig.len(),
                signature: i,
            });
        }
    }
    matches.sort_unstable_by_key(|m| (m.end, m.signature));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_position_ordered() {
        let data = [0xAA, 0xBB, 0x00, 0xCC, 0x00, 0xAA, 0xBB];
        let sigs: [&[u8]; 2] = [&[0xAA, 0xBB], &[0xCC]];
        let found = scan(&data, &sigs, data.len());
        assert_eq!(
            found,
            vec![
                Match { end: 2, signature: 0 },
                Match { end: 4, signature: 1 },
                Match { end: 7, signature: 0 },
            ]
        );
    }

    #[test]
    fn same_end_breaks_by_registration_order() {
        // both signatures end at offset 3
        let data = [0x01, 0x02, 0x03];
        let sigs: [&[u8]; 2] = [&[0x02, 0x03], &[0x03]];
        let found = scan(&data, &sigs, data.len());
        assert_eq!(found[0].signature, 0);
        assert_eq!(found[1].signature, 1);
    }

    #[test]
    fn limit_truncates_the_scan() {
        let data = [0xAA, 0x00, 0x00, 0x00, 0xAA, 0x00];
        let sigs: [&[u8]; 1] = [&[0xAA]];
        let found = scan(&data, &sigs, 2);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn per_signature_matches_do_not_overlap() {
        let data = [0xAA, 0xAA, 0xAA];
        let sigs: [&[u8]; 1] = [&[0xAA, 0xAA]];
        let found = scan(&data, &sigs, data.len());
        assert_eq!(found.len(), 1);
    }
}
