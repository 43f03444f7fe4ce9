//! Export to the DEC decomposition file format.

use std::io::Write;

use crate::error::{DecompError, Result};
use crate::partial::PartialDecomposition;

impl PartialDecomposition<'_> {
    /// Writes the decomposition in DEC format.
    ///
    /// Blocks are numbered from 1 in the file. Constraints are listed by
    /// name in ascending index order.
    ///
    /// # Errors
    ///
    /// Returns [`DecompError::Incomplete`] if any index is still open, and
    /// [`DecompError::Io`] if writing fails.
    pub fn write_dec<W: Write>(&self, writer: &mut W) -> Result<()> {
        if !self.is_complete() {
            return Err(DecompError::Incomplete {
                id: self.id,
                open_conss: self.n_open_conss(),
                open_vars: self.n_open_vars(),
            });
        }
        let sorted = |values: &[usize]| {
            let mut values = values.to_vec();
            values.sort_unstable();
            values
        };

        writeln!(writer, "PRESOLVED")?;
        writeln!(writer, "{}", u8::from(self.space_kind().is_presolved()))?;
        writeln!(writer, "NBLOCKS")?;
        writeln!(writer, "{}", self.n_blocks)?;
        for block in 0..self.n_blocks {
            writeln!(writer, "BLOCK {}", block + 1)?;
            for cons in sorted(self.conss_for_block(block)) {
                writeln!(writer, "{}", self.space.cons_name(cons))?;
            }
        }
        writeln!(writer, "MASTERCONSS")?;
        for cons in sorted(&self.master_conss) {
            writeln!(writer, "{}", self.space.cons_name(cons))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockforge_core::MatrixBuilder;

    #[test]
    fn test_write_dec() {
        let mut builder = MatrixBuilder::new();
        let x = builder.add_binary("x").unwrap();
        let y = builder.add_binary("y").unwrap();
        builder.add_cons("link", &[(x, 1.0), (y, 1.0)], 0.0, 1.0).unwrap();
        builder.add_cons("only_x", &[(x, 1.0)], 0.0, 1.0).unwrap();
        builder.add_cons("only_y", &[(y, 1.0)], 0.0, 1.0).unwrap();
        let matrix = builder.build();

        let mut decomp = PartialDecomposition::new(7, &matrix);
        decomp.book_as_master_cons(0).unwrap();
        decomp.flush_booked().unwrap();
        decomp.complete_by_connected().unwrap();

        let mut out = Vec::new();
        decomp.write_dec(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "PRESOLVED\n0\nNBLOCKS\n2\nBLOCK 1\nonly_x\nBLOCK 2\nonly_y\nMASTERCONSS\nlink\n"
        );
    }

    #[test]
    fn test_write_dec_incomplete() {
        let mut builder = MatrixBuilder::new();
        let x = builder.add_binary("x").unwrap();
        builder.add_cons("c", &[(x, 1.0)], 0.0, 1.0).unwrap();
        let matrix = builder.build();

        let decomp = PartialDecomposition::new(3, &matrix);
        let mut out = Vec::new();
        let err = decomp.write_dec(&mut out).unwrap_err();
        assert!(matches!(
            err,
            DecompError::Incomplete {
                id: 3,
                open_conss: 1,
                open_vars: 1
            }
        ));
        assert!(out.is_empty());
    }
}
