//! Upload filename composition and lifetime extraction.
//!
//! Wire format (the only persisted format of the whole system):
//!
//! ```text
//! <random:4><code:1>-<base>[<version suffix>]<ext>
//! ```
//!
//! e.g. `EIcLm-buchungen.pdf`: prefix `EIcL`, lifetime code `m` (1 week),
//! base `buchungen`, extension `.pdf`. The code position is fixed, so the
//! sweeper can recover the policy from any filename without consulting the
//! random prefix.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;

use crate::error::NameError;
use crate::lifetime::{LifetimeTable, CODE_ALPHABET};

/// Width of the random namespace-diffusion prefix.
pub const RANDOM_PREFIX_LEN: usize = 4;

/// Percent-encoding set for filename components used as a URL path segment.
/// Alphanumerics and `_ . - ~` stay literal.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Percent-encode one filename component for use in a URL path.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Retention policy recovered from a filename at sweep time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAgePolicy {
    /// Delete once the file is strictly older than this.
    Expires(Duration),
    /// Explicit "forever" code; never delete.
    NoExpiry,
    /// Not a name this tool produced (or a code from a newer version); never delete.
    Unknown,
}

/// A composed upload name. Created once per upload, never mutated; the
/// rendered string is the only record the server retains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFilename {
    pub random_prefix: String,
    pub lifetime_code: char,
    pub base: String,
    pub version_suffix: String,
    pub ext: String,
}

impl UploadFilename {
    /// The literal remote filename.
    pub fn remote_name(&self) -> String {
        format!(
            "{}{}-{}{}{}",
            self.random_prefix, self.lifetime_code, self.base, self.version_suffix, self.ext
        )
    }

    /// The remote filename with base, suffix, and extension percent-encoded
    /// for use as a URL path segment. Prefix and code are always drawn from
    /// the alphabet and need no encoding.
    pub fn encoded_name(&self) -> String {
        format!(
            "{}{}-{}{}{}",
            self.random_prefix,
            self.lifetime_code,
            encode_component(&self.base),
            encode_component(&self.version_suffix),
            encode_component(&self.ext)
        )
    }
}

impl std::fmt::Display for UploadFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.remote_name())
    }
}

/// Draw a prefix of [`RANDOM_PREFIX_LEN`] characters uniformly from the
/// alphabet. Carries no meaning; it only spreads unrelated uploads across a
/// shared flat namespace.
pub fn random_prefix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..RANDOM_PREFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Split a path into (base, ext) of its final component.
///
/// Only the final dot is split off (`archive.tar.xz` → `archive.tar` /
/// `.xz`); a leading-dot name such as `.bashrc` has no extension.
fn split_name(path: &str) -> (String, String) {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(idx) if idx > 0 => (name[..idx].to_string(), name[idx..].to_string()),
        _ => (name, String::new()),
    }
}

/// Compose an upload name for `local_path` under the given lifetime label.
///
/// The path need not exist; existence is the uploader's concern. Fails with
/// [`NameError::UnknownLabel`] if the label is not on the menu, in which
/// case nothing should be uploaded.
pub fn compose<R: Rng + ?Sized>(
    local_path: &str,
    lifetime_label: &str,
    version_suffix: &str,
    table: &LifetimeTable,
    rng: &mut R,
) -> Result<UploadFilename, NameError> {
    let lifetime_code = table.code_for_label(lifetime_label)?;
    let (base, ext) = split_name(local_path);

    Ok(UploadFilename {
        random_prefix: random_prefix(rng),
        lifetime_code,
        base,
        version_suffix: version_suffix.to_string(),
        ext,
    })
}

/// Recover the retention policy from an arbitrary filename.
///
/// Applies the fixed positional pattern: [`RANDOM_PREFIX_LEN`] alphabet
/// characters, one code character, a literal hyphen. Anything else — too
/// short, foreign characters, an unassigned code — is [`FileAgePolicy::Unknown`].
/// Never fails: swept directories may contain files this tool did not create.
pub fn extract_max_age(filename: &str, table: &LifetimeTable) -> FileAgePolicy {
    let bytes = filename.as_bytes();
    if bytes.len() < RANDOM_PREFIX_LEN + 2 {
        return FileAgePolicy::Unknown;
    }
    if !bytes[..RANDOM_PREFIX_LEN]
        .iter()
        .all(|b| CODE_ALPHABET.contains(b))
    {
        return FileAgePolicy::Unknown;
    }
    let code = bytes[RANDOM_PREFIX_LEN];
    if !CODE_ALPHABET.contains(&code) || bytes[RANDOM_PREFIX_LEN + 1] != b'-' {
        return FileAgePolicy::Unknown;
    }

    match table.decode(code as char) {
        Ok(d) if d == Duration::ZERO => FileAgePolicy::NoExpiry,
        Ok(d) => FileAgePolicy::Expires(d),
        Err(_) => FileAgePolicy::Unknown,
    }
}

/// Version suffix for the current local time, e.g. `-23dec-0657pm`.
pub fn version_suffix() -> String {
    version_suffix_at(Local::now())
}

/// Version suffix for an explicit timestamp.
pub fn version_suffix_at(now: DateTime<Local>) -> String {
    now.format("-%d%b-%I%M%p").to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> LifetimeTable {
        LifetimeTable::canonical()
    }

    #[test]
    fn compose_end_to_end_round_trip() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(7);
        let name = compose("report.pdf", "1 week", "", &table, &mut rng).unwrap();
        let rendered = name.remote_name();

        // ^[A-Za-z0-9_-]{4}m-report\.pdf$
        assert_eq!(rendered.len(), "XXXXm-report.pdf".len());
        assert!(rendered
            .chars()
            .take(RANDOM_PREFIX_LEN)
            .all(crate::lifetime::in_alphabet));
        assert_eq!(&rendered[RANDOM_PREFIX_LEN..], "m-report.pdf");

        assert_eq!(
            extract_max_age(&rendered, &table),
            FileAgePolicy::Expires(Duration::from_secs(604800))
        );
    }

    #[test]
    fn compose_is_deterministic_except_prefix() {
        let table = table();
        let mut a_rng = StdRng::seed_from_u64(1);
        let mut b_rng = StdRng::seed_from_u64(2);
        let a = compose("/tmp/report.pdf", "2 days", "-v2", &table, &mut a_rng).unwrap();
        let b = compose("/tmp/report.pdf", "2 days", "-v2", &table, &mut b_rng).unwrap();

        assert_ne!(a.random_prefix, b.random_prefix);
        assert_eq!(a.lifetime_code, b.lifetime_code);
        assert_eq!(a.base, b.base);
        assert_eq!(a.version_suffix, b.version_suffix);
        assert_eq!(a.ext, b.ext);
    }

    #[test]
    fn compose_rejects_unknown_label() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            compose("report.pdf", "3 weeks", "", &table, &mut rng),
            Err(NameError::UnknownLabel("3 weeks".to_string()))
        );
    }

    #[test]
    fn compose_forever_uses_zero_code() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(0);
        let name = compose("notes.txt", "forever", "", &table, &mut rng).unwrap();
        assert_eq!(name.lifetime_code, '0');
        assert_eq!(
            extract_max_age(&name.remote_name(), &table),
            FileAgePolicy::NoExpiry
        );
    }

    #[test]
    fn split_keeps_only_final_extension() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(3);
        let name = compose("/data/archive.tar.xz", "1 day", "", &table, &mut rng).unwrap();
        assert_eq!(name.base, "archive.tar");
        assert_eq!(name.ext, ".xz");
    }

    #[test]
    fn dotfile_has_no_extension() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(4);
        let name = compose("/home/user/.bashrc", "1 hour", "", &table, &mut rng).unwrap();
        assert_eq!(name.base, ".bashrc");
        assert_eq!(name.ext, "");
    }

    #[test]
    fn extension_free_name() {
        let table = table();
        let mut rng = StdRng::seed_from_u64(5);
        let name = compose("Makefile", "1 day", "", &table, &mut rng).unwrap();
        assert_eq!(name.base, "Makefile");
        assert_eq!(name.ext, "");
        assert_eq!(name.remote_name().len(), RANDOM_PREFIX_LEN + 2 + "Makefile".len());
    }

    #[test]
    fn encoded_name_quotes_base_but_not_prefix() {
        let name = UploadFilename {
            random_prefix: "EIcL".to_string(),
            lifetime_code: 'm',
            base: "buchungen fernwärme".to_string(),
            version_suffix: "".to_string(),
            ext: ".pdf".to_string(),
        };
        assert_eq!(
            name.encoded_name(),
            "EIcLm-buchungen%20fernw%C3%A4rme.pdf"
        );
        assert_eq!(name.remote_name(), "EIcLm-buchungen fernwärme.pdf");
    }

    #[test]
    fn extract_known_example() {
        assert_eq!(
            extract_max_age("EIcLm-buchungen.pdf", &table()),
            FileAgePolicy::Expires(Duration::from_secs(604800))
        );
        // percent-encoded base does not disturb the fixed positions
        assert_eq!(
            extract_max_age("EIcLm-buchungen-fernw%C3%A4rme-23dez-0657.pdf", &table()),
            FileAgePolicy::Expires(Duration::from_secs(604800))
        );
    }

    #[test]
    fn malformed_names_are_unknown() {
        let table = table();
        for name in ["nohyphenhere", "", "abc", "abcd", "abcde", "ab-cd", "abcdm_rest"] {
            assert_eq!(extract_max_age(name, &table), FileAgePolicy::Unknown, "{name:?}");
        }
        // separator in the wrong spot
        assert_eq!(extract_max_age("abc-em-x", &table), FileAgePolicy::Unknown);
        // non-alphabet prefix character
        assert_eq!(extract_max_age("ab!cm-x.pdf", &table), FileAgePolicy::Unknown);
        // non-ASCII where the code should be
        assert_eq!(extract_max_age("abcdä-x.pdf", &table), FileAgePolicy::Unknown);
    }

    #[test]
    fn unassigned_code_is_unknown() {
        let table = table();
        assert_eq!(extract_max_age("abcdz-file.txt", &table), FileAgePolicy::Unknown);
        assert_eq!(extract_max_age("abcdM-file.txt", &table), FileAgePolicy::Unknown);
    }

    #[test]
    fn random_prefix_stays_in_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            let prefix = random_prefix(&mut rng);
            assert_eq!(prefix.len(), RANDOM_PREFIX_LEN);
            assert!(prefix.chars().all(crate::lifetime::in_alphabet));
        }
    }

    #[test]
    fn version_suffix_format() {
        let t = Local.with_ymd_and_hms(2023, 12, 23, 18, 57, 0).unwrap();
        assert_eq!(version_suffix_at(t), "-23dec-0657pm");
    }
}
