// Reading the item sources of a study.

use bws_design::builder::PoolBuilder;

use crate::bws::*;

/// Adds the items of a text file to the builder. Returns the number of new items.
pub fn read_item_file(builder: &mut PoolBuilder, path: &str) -> BwsResult<usize> {
    let bytes = fs::read(path).context(OpeningFileSnafu { path })?;
    debug!("read_item_file: {} bytes from {}", bytes.len(), path);
    Ok(builder.add_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "joyful\nboring\r\n\nannoyed\n").unwrap();
        fs::write(&b, "boring\nexcited\n").unwrap();

        let mut builder = PoolBuilder::new();
        assert_eq!(
            read_item_file(&mut builder, &a.display().to_string()).unwrap(),
            3
        );
        assert_eq!(
            read_item_file(&mut builder, &b.display().to_string()).unwrap(),
            1
        );
        assert_eq!(builder.len(), 4);
    }

    #[test]
    fn missing_file() {
        let mut builder = PoolBuilder::new();
        let res = read_item_file(&mut builder, "/no/such/items.txt");
        match res {
            Err(BwsError::OpeningFile { path, .. }) => assert_eq!(path, "/no/such/items.txt"),
            other => panic!("{:?}", other),
        }
    }
}
