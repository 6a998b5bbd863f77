use anyhow::{Result, bail};

/// Seed as given on the command line plus its canonical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub token: String,
}

fn parse_hex(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))?;
    u64::from_str_radix(&digits.replace('_', ""), 16).ok()
}

/// Resolve CLI seed arguments into canonical seeds.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex. Duplicates are dropped, first occurrence wins.
///
/// # Errors
///
/// Returns an error for any token that is not a seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut resolved: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Some(value) = parse_hex(token) {
            value
        } else {
            bail!("unrecognised seed '{token}'");
        };

        if resolved.iter().all(|info| info.seed != seed) {
            resolved.push(SeedInfo {
                seed,
                token: token.clone(),
            });
        }
    }

    if resolved.is_empty() {
        bail!("no seeds given");
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_decimal_negative_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["1337", "-5", "0xC0_FFEE"])).unwrap();
        let values: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
        assert_eq!(values, vec![1337, 5, 0x00C0_FFEE]);
        assert_eq!(seeds[2].token, "0xC0_FFEE");
    }

    #[test]
    fn duplicates_collapse() {
        let seeds = resolve_seed_inputs(&tokens(&["7", "0x7", "7"])).unwrap();
        assert_eq!(
            seeds,
            vec![SeedInfo {
                seed: 7,
                token: "7".to_string()
            }]
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let err = resolve_seed_inputs(&tokens(&["12", "banana"])).unwrap_err();
        assert!(err.to_string().contains("banana"));
        assert!(resolve_seed_inputs(&[]).is_err());
    }
}
