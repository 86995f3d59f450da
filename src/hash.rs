use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use xxhash_rust::xxh3::{xxh3_128_with_seed, Xxh3};

const SEED: u64 = 0xdeadbeef;
const CHUNK: usize = 64 * 1024;

pub fn content_hash(buf: &[u8]) -> u128 {
    xxh3_128_with_seed(buf, SEED)
}

pub fn file_hash(path: &Path) -> io::Result<u128> {
    let mut reader = BufReader::with_capacity(CHUNK, File::open(path)?);
    let mut xxh: Xxh3 = Xxh3::with_seed(SEED);
    let mut chunk = vec![0u8; CHUNK];
    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        xxh.update(&chunk[..read]);
    }
    Ok(xxh.digest128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_hash_matches_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        assert_eq!(file_hash(&path).unwrap(), content_hash(&data));
        assert_ne!(content_hash(&data), content_hash(&data[1..]));
    }
}
