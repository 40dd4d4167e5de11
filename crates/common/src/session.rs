use crate::types::WorldSeed;

/// Name used when the player leaves the level name blank.
pub const DEFAULT_LEVEL_NAME: &str = "Untitled World";

/// Upper bound (exclusive) for randomly chosen seeds.
pub const RANDOM_SEED_RANGE: i64 = 999_999_999;

/// Trim a level name, falling back to [`DEFAULT_LEVEL_NAME`] when blank.
pub fn sanitize_level_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_LEVEL_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turn raw seed text into a world seed.
///
/// Blank input picks a random seed, an optionally signed decimal literal is used
/// as-is, and any other text is hashed over its UTF-16 code units with
/// `h = h * 31 + c` wrapping in 32 bits.
pub fn sanitize_seed(raw: &str) -> WorldSeed {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return WorldSeed(fastrand::i64(0..RANDOM_SEED_RANGE));
    }
    if is_integer_literal(trimmed) {
        // literals beyond i64 saturate rather than falling back to the text hash
        let value = trimmed.parse::<i64>().unwrap_or(if trimmed.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        });
        return WorldSeed(value);
    }
    WorldSeed(i64::from(hash_seed_text(trimmed)))
}

/// Character-by-character text hash used for non-numeric seeds.
pub fn hash_seed_text(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Validated inputs for starting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub name: String,
    pub seed: WorldSeed,
}

impl SessionSettings {
    /// Build settings from the raw menu fields.
    pub fn from_input(name: &str, seed: &str) -> Self {
        Self {
            name: sanitize_level_name(name),
            seed: sanitize_seed(seed),
        }
    }
}
