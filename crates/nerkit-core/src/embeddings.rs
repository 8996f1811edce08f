//! # Pretrained Embeddings
//!
//! Word vectors trimmed down to the task vocabulary. The matrix is stored
//! as a single 2-D array inside an `.npz` archive, one row per word id.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use ndarray::{Array2, Ix2, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use tracing::{debug, info};

use crate::error::{NerError, Result};
use crate::vocab::Vocabulary;

/// Archive key the trimmed matrix is stored under.
pub const NPZ_KEY: &str = "embeddings";

/// A `rows x dim` matrix of `f32` word vectors aligned with word ids.
#[derive(Debug, Clone)]
pub struct Embeddings {
    matrix: Tensor,
}

impl Embeddings {
    /// Wrap an existing 2-D tensor.
    pub fn from_tensor(matrix: Tensor) -> Result<Self> {
        if matrix.rank() != 2 {
            return Err(NerError::InvalidEmbeddings(format!(
                "expected a 2-D matrix, got shape {:?}",
                matrix.dims()
            )));
        }
        let matrix = matrix.to_dtype(DType::F32)?;
        Ok(Self { matrix })
    }

    /// Load a trimmed embeddings archive produced by the build step.
    ///
    /// The array stored under [`NPZ_KEY`] is used; an archive holding a
    /// single array under any other name is accepted too. Stored and
    /// deflate-compressed archives are read, with `f32` or `f64` values.
    pub fn load_trimmed<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NerError::from_io(path, e))?;
        let mut npz = NpzReader::new(file).map_err(|e| npz_error(path, e))?;

        let mut names = npz.names().map_err(|e| npz_error(path, e))?;
        let position = names
            .iter()
            .position(|name| name == NPZ_KEY || name.strip_suffix(".npy") == Some(NPZ_KEY));
        let name = match (position, names.len()) {
            (Some(idx), _) => names.swap_remove(idx),
            (None, 1) => names.remove(0),
            (None, n) => {
                return Err(NerError::InvalidEmbeddings(format!(
                    "{} holds {n} arrays and none is named {NPZ_KEY:?}",
                    path.display()
                )));
            }
        };

        let array: Array2<f32> = match npz.by_name::<OwnedRepr<f32>, Ix2>(&name) {
            Ok(array) => array,
            Err(f32_err) => npz
                .by_name::<OwnedRepr<f64>, Ix2>(&name)
                .map(|array| array.mapv(|v| v as f32))
                .map_err(|_| {
                    NerError::InvalidEmbeddings(format!(
                        "{}: array {name:?} is not a 2-D float matrix: {f32_err}",
                        path.display()
                    ))
                })?,
        };

        let (rows, dim) = array.dim();
        let data: Vec<f32> = array.iter().copied().collect();
        let matrix = Tensor::from_vec(data, (rows, dim), &Device::Cpu)?;
        let embeddings = Self::from_tensor(matrix)?;
        info!(
            "loaded embeddings {}x{} from {}",
            embeddings.rows(),
            embeddings.dim(),
            path.display()
        );
        Ok(embeddings)
    }

    /// Save the matrix as a deflate-compressed `.npz` archive under [`NPZ_KEY`].
    pub fn save_trimmed<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = self.matrix.flatten_all()?.to_vec1::<f32>()?;
        let array = Array2::from_shape_vec((self.rows(), self.dim()), data)
            .map_err(|e| NerError::InvalidEmbeddings(e.to_string()))?;

        let mut npz = NpzWriter::new_compressed(File::create(path)?);
        npz.add_array(NPZ_KEY, &array).map_err(|e| npz_error(path, e))?;
        npz.finish().map_err(|e| npz_error(path, e))?;

        debug!("saved trimmed embeddings to {}", path.display());
        Ok(())
    }

    /// Build a trimmed matrix from a GloVe text file.
    ///
    /// Row `i` holds the vector of `vocab.token(i)`. Words missing from the
    /// GloVe file keep an all-zero row.
    pub fn trim_glove<P: AsRef<Path>>(glove: P, vocab: &Vocabulary, dim: usize) -> Result<Self> {
        let glove = glove.as_ref();
        let file = File::open(glove).map_err(|e| NerError::from_io(glove, e))?;
        let reader = BufReader::new(file);

        let mut data = vec![0.0f32; vocab.len() * dim];
        let mut found = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.trim_end().split(' ');
            let Some(word) = parts.next() else {
                continue;
            };
            let Some(id) = vocab.id(word) else {
                continue;
            };

            let vector = parts
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    NerError::InvalidEmbeddings(format!(
                        "{}:{}: {e}",
                        glove.display(),
                        line_no + 1
                    ))
                })?;
            if vector.len() != dim {
                return Err(NerError::InvalidEmbeddings(format!(
                    "{}:{}: expected {dim} values, found {}",
                    glove.display(),
                    line_no + 1,
                    vector.len()
                )));
            }

            data[id * dim..(id + 1) * dim].copy_from_slice(&vector);
            found += 1;
        }

        info!(
            "found {found}/{} vocabulary words in {}",
            vocab.len(),
            glove.display()
        );
        let matrix = Tensor::from_vec(data, (vocab.len(), dim), &Device::Cpu)?;
        Ok(Self { matrix })
    }

    /// Number of rows (one per word id).
    pub fn rows(&self) -> usize {
        self.matrix.dims()[0]
    }

    /// Vector length.
    pub fn dim(&self) -> usize {
        self.matrix.dims()[1]
    }

    /// Copy out the vector for word `id`.
    pub fn row(&self, id: usize) -> Result<Vec<f32>> {
        if id >= self.rows() {
            return Err(NerError::InvalidEmbeddings(format!(
                "row {id} out of range for {} rows",
                self.rows()
            )));
        }
        Ok(self.matrix.get(id)?.to_vec1::<f32>()?)
    }

    pub fn tensor(&self) -> &Tensor {
        &self.matrix
    }
}

fn npz_error(path: &Path, err: impl std::fmt::Display) -> NerError {
    NerError::Npz(format!("{}: {err}", path.display()))
}

/// Collect the set of words a GloVe text file has vectors for.
pub fn glove_vocab<P: AsRef<Path>>(glove: P) -> Result<HashSet<String>> {
    let glove = glove.as_ref();
    let file = File::open(glove).map_err(|e| NerError::from_io(glove, e))?;
    let mut words = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some(word) = line.split(' ').next().filter(|w| !w.is_empty()) {
            words.insert(word.to_string());
        }
    }
    debug!("{} words in {}", words.len(), glove.display());
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_glove(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("glove.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "cat 0.1 0.2 0.3").unwrap();
        writeln!(file, "dog 1.0 2.0 3.0").unwrap();
        writeln!(file, "the -1 0 1").unwrap();
        path
    }

    #[test]
    fn test_trim_glove_aligns_rows() {
        let dir = tempfile::tempdir().unwrap();
        let glove = write_glove(dir.path());
        let vocab = Vocabulary::from_tokens(["the", "mouse", "dog"]);

        let emb = Embeddings::trim_glove(&glove, &vocab, 3).unwrap();
        assert_eq!(emb.rows(), 3);
        assert_eq!(emb.dim(), 3);
        assert_eq!(emb.row(0).unwrap(), vec![-1.0, 0.0, 1.0]);
        assert_eq!(emb.row(1).unwrap(), vec![0.0, 0.0, 0.0]);
        assert_eq!(emb.row(2).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(emb.row(3).is_err());
    }

    #[test]
    fn test_trim_glove_rejects_wrong_dim() {
        let dir = tempfile::tempdir().unwrap();
        let glove = write_glove(dir.path());
        let vocab = Vocabulary::from_tokens(["cat"]);

        let err = Embeddings::trim_glove(&glove, &vocab, 4).unwrap_err();
        assert!(matches!(err, NerError::InvalidEmbeddings(_)));
    }

    #[test]
    fn test_save_and_load_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let glove = write_glove(dir.path());
        let vocab = Vocabulary::from_tokens(["cat", "the"]);
        let emb = Embeddings::trim_glove(&glove, &vocab, 3).unwrap();

        let npz = dir.path().join("trimmed.npz");
        emb.save_trimmed(&npz).unwrap();

        let loaded = Embeddings::load_trimmed(&npz).unwrap();
        assert_eq!(loaded.rows(), vocab.len());
        assert_eq!(loaded.row(0).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_load_compressed_f64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glove.trimmed.npz");
        let array = ndarray::arr2(&[[0.5f64, -1.0], [2.0, 0.25], [0.0, 3.0]]);
        let mut npz = NpzWriter::new_compressed(File::create(&path).unwrap());
        npz.add_array(NPZ_KEY, &array).unwrap();
        npz.finish().unwrap();

        let emb = Embeddings::load_trimmed(&path).unwrap();
        assert_eq!((emb.rows(), emb.dim()), (3, 2));
        assert_eq!(emb.row(1).unwrap(), vec![2.0, 0.25]);
    }

    #[test]
    fn test_load_single_unnamed_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.npz");
        let array = ndarray::arr2(&[[1.0f32, 2.0, 3.0]]);
        let mut npz = NpzWriter::new_compressed(File::create(&path).unwrap());
        npz.add_array("arr_0", &array).unwrap();
        npz.finish().unwrap();

        let emb = Embeddings::load_trimmed(&path).unwrap();
        assert_eq!(emb.row(0).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_load_rejects_1d_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.npz");
        let array = ndarray::arr1(&[1.0f32, 2.0]);
        let mut npz = NpzWriter::new_compressed(File::create(&path).unwrap());
        npz.add_array(NPZ_KEY, &array).unwrap();
        npz.finish().unwrap();

        let err = Embeddings::load_trimmed(&path).unwrap_err();
        assert!(matches!(err, NerError::InvalidEmbeddings(_)));
    }

    #[test]
    fn test_load_not_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.npz");
        std::fs::write(&path, "not a zip").unwrap();

        let err = Embeddings::load_trimmed(&path).unwrap_err();
        assert!(matches!(err, NerError::Npz(_)));
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Embeddings::load_trimmed(dir.path().join("none.npz")).unwrap_err();
        assert!(matches!(err, NerError::FileNotFound { .. }));
    }

    #[test]
    fn test_rejects_vector() {
        let t = Tensor::new(&[1.0f32, 2.0], &Device::Cpu).unwrap();
        assert!(matches!(
            Embeddings::from_tensor(t),
            Err(NerError::InvalidEmbeddings(_))
        ));
    }

    #[test]
    fn test_glove_vocab() {
        let dir = tempfile::tempdir().unwrap();
        let words = glove_vocab(write_glove(dir.path())).unwrap();
        assert_eq!(words.len(), 3);
        assert!(words.contains("dog"));
    }
}
