use crate::errors::*;
use crate::seq::*;

pub fn trim_ascii_whitespace(b: &[u8]) -> Option<&[u8]> {
    let start = b.iter().position(|&c| !c.is_ascii_whitespace())?;
    let end = b.iter().rposition(|&c| !c.is_ascii_whitespace())?;
    Some(&b[start..=end])
}

/// Trim, uppercase and translate `U` to `T`. Blank input gives an empty sequence.
pub fn normalize_sequence(b: &[u8], context: &str) -> Result<Vec<u8>> {
    let Some(trimmed) = trim_ascii_whitespace(b) else {
        return Ok(Vec::new());
    };

    if !trimmed.iter().all(|&c| is_iupac(c)) {
        return Err(Error::InvalidSequence {
            string: utf8(trimmed),
            context: context.to_owned(),
        });
    }

    let mut seq = trimmed.to_ascii_uppercase();
    rna_to_dna(&mut seq);
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize() {
        assert_eq!(normalize_sequence(b"  acgu\n", "adapter").unwrap(), b"ACGT");
        assert_eq!(normalize_sequence(b"NNRY", "adapter").unwrap(), b"NNRY");
        assert!(normalize_sequence(b" \t", "adapter").unwrap().is_empty());
        assert!(matches!(
            normalize_sequence(b"ACG-T", "constant"),
            Err(Error::InvalidSequence { .. })
        ));
    }
}
