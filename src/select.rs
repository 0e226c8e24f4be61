//! Interactive keeper selection over the posters directory
//!
//! Only files named `{title}.{number}.{ext}` take part. For each title the
//! operator is asked for a number until one of that title's numbers is
//! entered verbatim; the other candidates are deleted and the keeper is
//! renamed to `{title}.{ext}`.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::PLACEHOLDER_FILE;

/// Candidate file names keyed by title, then by number as written in the name
pub type PosterGroups = BTreeMap<String, BTreeMap<String, String>>;

/// Names of every entry in the posters directory
///
/// Names that are not valid UTF-8 cannot follow the naming protocol and are
/// reported and left out.
pub fn list_posters(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list posters directory: {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        match entry?.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => println!("File {:?} has the wrong name format. Ignoring.", name),
        }
    }
    Ok(names)
}

/// Group candidate files by title
///
/// Names that do not split into exactly three `.` fields are reported and
/// left out, which includes single-candidate `{title}.{ext}` files.
pub fn group_posters<S: AsRef<str>>(names: &[S]) -> PosterGroups {
    let mut by_title = PosterGroups::new();

    for name in names {
        let name = name.as_ref();
        if name == PLACEHOLDER_FILE {
            continue;
        }

        let fields: Vec<&str> = name.split('.').collect();
        let [title, number, _ext] = fields.as_slice() else {
            println!("File {} has the wrong name format. Ignoring.", name);
            continue;
        };

        by_title
            .entry(title.to_string())
            .or_default()
            .insert(number.to_string(), name.to_string());
    }

    by_title
}

/// Describe the accepted answers, "1-3" when they run 1..=n
fn key_hint(files: &BTreeMap<String, String>) -> String {
    let contiguous = (1..=files.len()).all(|n| files.contains_key(&n.to_string()));
    if contiguous {
        format!("1-{}", files.len())
    } else {
        files.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Prompt until the answer is exactly one of the group's numbers
///
/// Invalid answers re-prompt forever. Running out of input is an error.
pub fn prompt_keeper<R: BufRead, W: Write>(
    title: &str,
    files: &BTreeMap<String, String>,
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    let hint = key_hint(files);
    loop {
        write!(output, "{} poster ({})? ", title, hint)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("Input closed while choosing a poster for {}", title);
        }
        let answer = line
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(&line);

        if files.contains_key(answer) {
            return Ok(answer.to_string());
        }
        writeln!(output, "Please choose a number ({}).", hint)?;
    }
}

/// Delete every candidate but `keeper` and rename it to `{title}.{ext}`
pub fn keep_only(dir: &Path, files: &BTreeMap<String, String>, keeper: &str) -> Result<PathBuf> {
    let Some(keeper_name) = files.get(keeper) else {
        bail!("{} is not one of the candidates", keeper);
    };

    for (number, name) in files {
        if number != keeper {
            let path = dir.join(name);
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete {}", path.display()))?;
        }
    }

    let fields: Vec<&str> = keeper_name.split('.').collect();
    let [title, _number, ext] = fields.as_slice() else {
        bail!("File {} has the wrong name format", keeper_name);
    };
    let from = dir.join(keeper_name);
    let to = dir.join(format!("{}.{}", title, ext));
    fs::rename(&from, &to)
        .with_context(|| format!("Failed to rename {} to {}", from.display(), to.display()))?;
    Ok(to)
}

/// Run the whole selection pass, returning the kept files
pub fn choose_keepers<R: BufRead, W: Write>(
    dir: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<Vec<PathBuf>> {
    let names = list_posters(dir)?;
    let groups = group_posters(names.as_slice());
    log::debug!("{} poster groups in {}", groups.len(), dir.display());

    let mut kept = Vec::new();
    for (title, files) in &groups {
        let keeper = prompt_keeper(title, files, input, output)?;
        kept.push(keep_only(dir, files, &keeper)?);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dune_files() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("1".to_string(), "Dune.1.jpg".to_string()),
            ("2".to_string(), "Dune.2.png".to_string()),
            ("3".to_string(), "Dune.3.jpg".to_string()),
        ])
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"poster").unwrap();
        }
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names = list_posters(dir).unwrap();
        names.sort();
        names
    }

    #[test]
    fn test_group_posters() {
        let groups = group_posters(&["Dune.1.jpg", "Dune.2.png", "Marsx.png"]);

        let expected = PosterGroups::from([(
            "Dune".to_string(),
            BTreeMap::from([
                ("1".to_string(), "Dune.1.jpg".to_string()),
                ("2".to_string(), "Dune.2.png".to_string()),
            ]),
        )]);
        assert_eq!(groups, expected);
    }

    #[test]
    fn test_group_posters_skips_placeholder_and_malformed() {
        let groups = group_posters(&[".gitkeep", "a.b.c.d", "noext", "Heat.1.jpg"]);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["Heat"]);
    }

    #[test]
    fn test_prompt_reprompts_until_valid_key() {
        let mut input = Cursor::new("5\n02\n\n2\n");
        let mut output = Vec::new();

        let keeper = prompt_keeper("Dune", &dune_files(), &mut input, &mut output).unwrap();

        assert_eq!(keeper, "2");
        let transcript = String::from_utf8(output).unwrap();
        assert_eq!(transcript.matches("Dune poster (1-3)? ").count(), 4);
        assert_eq!(transcript.matches("Please choose a number (1-3).").count(), 3);
    }

    #[test]
    fn test_prompt_accepts_crlf_answer() {
        let mut input = Cursor::new("3\r\n");
        let keeper = prompt_keeper("Dune", &dune_files(), &mut input, &mut Vec::new()).unwrap();
        assert_eq!(keeper, "3");
    }

    #[test]
    fn test_prompt_fails_when_input_runs_out() {
        let mut input = Cursor::new("9\n");
        let err = prompt_keeper("Dune", &dune_files(), &mut input, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Input closed"));
    }

    #[test]
    fn test_key_hint_lists_gaps() {
        let files = BTreeMap::from([
            ("1".to_string(), "Dune.1.jpg".to_string()),
            ("3".to_string(), "Dune.3.jpg".to_string()),
        ]);
        assert_eq!(key_hint(&files), "1, 3");
        assert_eq!(key_hint(&dune_files()), "1-3");
    }

    #[test]
    fn test_keep_only_leaves_single_renamed_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["Dune.1.jpg", "Dune.2.png", "Dune.3.jpg"]);

        let kept = keep_only(dir.path(), &dune_files(), "2").unwrap();

        assert_eq!(kept, dir.path().join("Dune.png"));
        assert_eq!(dir_names(dir.path()), vec!["Dune.png"]);
    }

    #[test]
    fn test_choose_keepers_reduces_each_group() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &[".gitkeep", "Dune.1.jpg", "Dune.2.png", "Heat.1.jpg", "Heat.2.jpg", "Marsx.png"],
        );
        let mut input = Cursor::new("2\n7\n1\n");
        let mut output = Vec::new();

        let kept = choose_keepers(dir.path(), &mut input, &mut output).unwrap();

        assert_eq!(kept, vec![dir.path().join("Dune.png"), dir.path().join("Heat.jpg")]);
        assert_eq!(
            dir_names(dir.path()),
            vec![".gitkeep", "Dune.png", "Heat.jpg", "Marsx.png"]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_left_alone() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["Dune.1.jpg", "Dune.2.jpg"]);
        let odd = dir.path().join(OsStr::from_bytes(b"Du\xffne.1.jpg"));
        fs::write(&odd, b"poster").unwrap();

        assert_eq!(dir_names(dir.path()), vec!["Dune.1.jpg", "Dune.2.jpg"]);

        let kept = choose_keepers(dir.path(), &mut Cursor::new("1\n"), &mut Vec::new()).unwrap();

        assert_eq!(kept, vec![dir.path().join("Dune.jpg")]);
        assert!(odd.is_file());
        assert_eq!(dir_names(dir.path()), vec!["Dune.jpg"]);
    }

    #[test]
    fn test_choose_keepers_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("posters");
        assert!(choose_keepers(&missing, &mut Cursor::new(""), &mut Vec::new()).is_err());
    }
}
