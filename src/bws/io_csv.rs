// Primitives for reading annotation files in CSV format.

use std::fs::File;

use crate::bws::*;

/// Reads the annotations of a CSV file.
///
/// Each row holds the best item, the worst item and then the items of the tuple.
/// A first row starting with `best` is treated as a header. Empty trailing cells
/// are dropped from the tuple.
pub fn read_annotations(path: &str) -> BwsResult<Vec<Annotation>> {
    let mut res: Vec<Annotation> = Vec::new();
    for (idx, line_r) in get_records(path)?.enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if idx == 0 && line.get(0).map(|s| s.trim()) == Some("best") {
            debug!("read_annotations: skipping header {:?}", line);
            continue;
        }
        if line.iter().all(|s| s.trim().is_empty()) {
            continue;
        }
        let best = line.get(0).context(CsvLineTooShortSnafu { lineno })?;
        let worst = line.get(1).context(CsvLineTooShortSnafu { lineno })?;
        let tuple: Vec<String> = line
            .iter()
            .skip(2)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if tuple.is_empty() {
            return CsvLineTooShortSnafu { lineno }.fail();
        }
        let best = best.trim().to_string();
        let worst = worst.trim().to_string();
        if !tuple.contains(&best) || !tuple.contains(&worst) {
            warn!(
                "read_annotations: line {}: the choices {:?} / {:?} are not in the tuple",
                lineno, best, worst
            );
        }
        debug!("read_annotations: lineno: {:?} tuple: {:?}", lineno, &tuple);
        res.push(Annotation { tuple, best, worst });
    }
    Ok(res)
}

fn get_records(path: &str) -> BwsResult<csv::StringRecordsIntoIter<File>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    Ok(rdr.into_records())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(content: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("annotations.csv");
        fs::write(&p, content).unwrap();
        (dir, p.display().to_string())
    }

    #[test]
    fn with_header() {
        let (_dir, p) = write_csv("best,worst,item1,item2,item3\nA,B,A,B,C\nB,D,B,C,D\n");
        let annotations = read_annotations(&p).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(
            annotations[0],
            Annotation {
                tuple: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                best: "A".to_string(),
                worst: "B".to_string(),
            }
        );
    }

    #[test]
    fn without_header_and_ragged_rows() {
        let (_dir, p) = write_csv("A,B,A,B,C,\nD,C,D,A,C,E\n\n");
        let annotations = read_annotations(&p).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].tuple.len(), 3);
        assert_eq!(annotations[1].tuple.len(), 4);
        assert_eq!(annotations[1].best, "D");
    }

    #[test]
    fn short_line() {
        let (_dir, p) = write_csv("A,B,A,B,C\nA,B\n");
        match read_annotations(&p) {
            Err(BwsError::CsvLineTooShort { lineno }) => assert_eq!(lineno, 2),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_annotations("/no/such/annotations.csv"),
            Err(BwsError::CsvOpen { .. })
        ));
    }
}
