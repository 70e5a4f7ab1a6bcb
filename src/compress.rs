use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use once_cell::sync::Lazy;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

/// Number of rows of the sumhash512 matrix, i.e. 64-bit words of compression output.
pub const N_ROWS: usize = 8;

/// Number of columns of the sumhash512 matrix, i.e. bits of compression input.
pub const M_BITS: usize = 1024;

/// Length in bytes of a compression input (chain value followed by one data block).
pub const INPUT_LEN: usize = M_BITS / 8;

/// Length in bytes of a compression output.
pub const OUTPUT_LEN: usize = N_ROWS * 8;

static ALGORAND_MATRIX: Lazy<Matrix> = Lazy::new(|| Matrix::random_from_seed(b"Algorand"));

/// algorand_matrix returns the public sumhash512 matrix, derived from the seed `"Algorand"`.
///
/// The matrix is generated on first use and shared read-only afterwards.
pub fn algorand_matrix() -> &'static Matrix {
    &ALGORAND_MATRIX
}

/// Matrix is the n-by-m sumhash matrix A with elements in Z_q where q=2^64.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    matrix: Box<[[u64; M_BITS]; N_ROWS]>,
}

impl Matrix {
    /// random_matrix reads a matrix from the random source, row by row, as little-endian words.
    pub fn random_matrix<T: ReadBytesExt>(mut rand: T) -> std::io::Result<Matrix> {
        let mut matrix = Box::new([[0u64; M_BITS]; N_ROWS]);
        for row in matrix.iter_mut() {
            rand.read_u64_into::<LittleEndian>(row)?;
        }
        Ok(Matrix { matrix })
    }

    /// random_from_seed creates a random-looking matrix to be used for the sumhash function using the seed bytes.
    pub fn random_from_seed(seed: &[u8]) -> Self {
        let mut xof = Shake256::default();
        xof.update(&64u16.to_le_bytes());
        xof.update(&(N_ROWS as u16).to_le_bytes());
        xof.update(&(M_BITS as u16).to_le_bytes());
        xof.update(seed);
        let mut reader = xof.finalize_xof();

        let mut matrix = Box::new([[0u64; M_BITS]; N_ROWS]);
        let mut row_bytes = [0u8; M_BITS * 8];
        for row in matrix.iter_mut() {
            reader.read(&mut row_bytes);
            LittleEndian::read_u64_into(&row_bytes, row);
        }
        Matrix { matrix }
    }

    /// row returns the i-th row of the matrix.
    pub fn row(&self, i: usize) -> &[u64; M_BITS] {
        &self.matrix[i]
    }
}

/// Compressor represents the compression function which is performed on a message.
pub trait Compressor: Clone {
    /// compress maps a 1024-bit message to 8 words and writes them into dst.
    fn compress(&self, dst: &mut [u64; N_ROWS], msg: &[u8; INPUT_LEN]);
}

impl<C: Compressor> Compressor for &C {
    fn compress(&self, dst: &mut [u64; N_ROWS], msg: &[u8; INPUT_LEN]) {
        (**self).compress(dst, msg)
    }
}

impl Compressor for Matrix {
    fn compress(&self, dst: &mut [u64; N_ROWS], msg: &[u8; INPUT_LEN]) {
        dst.iter_mut().zip(self.matrix.iter()).for_each(|(out, row)| {
            let mut x = 0u64;

            // Column 8*j+b is selected by bit b of msg[j], least significant bit first.
            // Selection is a mask, never a branch, so the running time does not depend on msg.
            msg.iter().zip(row.chunks_exact(8)).for_each(|(&m, a)| {
                let a0 = a[0] & -i64::from(m & 1) as u64;
                let a1 = a[1] & -i64::from((m >> 1) & 1) as u64;
                let a2 = a[2] & -i64::from((m >> 2) & 1) as u64;
                let a3 = a[3] & -i64::from((m >> 3) & 1) as u64;
                let a4 = a[4] & -i64::from((m >> 4) & 1) as u64;
                let a5 = a[5] & -i64::from((m >> 5) & 1) as u64;
                let a6 = a[6] & -i64::from((m >> 6) & 1) as u64;
                let a7 = a[7] & -i64::from((m >> 7) & 1) as u64;
                x = x
                    .wrapping_add(a0)
                    .wrapping_add(a1)
                    .wrapping_add(a2)
                    .wrapping_add(a3)
                    .wrapping_add(a4)
                    .wrapping_add(a5)
                    .wrapping_add(a6)
                    .wrapping_add(a7);
            });

            *out = x;
        })
    }
}
