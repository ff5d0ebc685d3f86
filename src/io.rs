//! TSV matrix loading and result writers.
//!
//! Matrix files are tab-separated: a header line whose first cell is ignored
//! and whose remaining cells name the columns, then one line per row with the
//! row name followed by the values. Blank lines and `#` comments are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::IoError;
use crate::matrix::Matrix;
use crate::{AxisClustering, ClusterConfig, MatrixClustering};

/// A matrix with row and column names.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    pub row_names: Vec<String>,
    pub col_names: Vec<String>,
    pub matrix: Matrix,
}

impl LabeledMatrix {
    /// Gather values and names into the given orders.
    pub fn reorder(&self, row_order: &[usize], col_order: &[usize]) -> Result<Self, IoError> {
        let matrix = self.matrix.reorder(row_order, col_order)?;
        Ok(LabeledMatrix {
            row_names: row_order.iter().map(|&i| self.row_names[i].clone()).collect(),
            col_names: col_order.iter().map(|&j| self.col_names[j].clone()).collect(),
            matrix,
        })
    }
}

pub fn read_matrix(path: &Path) -> Result<LabeledMatrix, IoError> {
    info!("Loading matrix from {:?}...", path);
    let file = File::open(path).map_err(|e| IoError::io(path, e))?;
    parse_matrix(BufReader::new(file), path)
}

fn parse_matrix<R: BufRead>(reader: R, path: &Path) -> Result<LabeledMatrix, IoError> {
    let parse_error = |line: usize, message: String| IoError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut col_names: Option<Vec<String>> = None;
    let mut row_names = Vec::new();
    let mut rows = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| IoError::io(path, e))?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split('\t');
        let first = parts.next().unwrap_or_default();

        if col_names.is_none() {
            col_names = Some(parts.map(str::to_string).collect());
            continue;
        }
        let expected = col_names.as_ref().map_or(0, Vec::len);

        let values = parts
            .map(|cell| {
                cell.trim()
                    .parse::<f64>()
                    .map_err(|_| parse_error(line_no, format!("not a number: {:?}", cell)))
                    .and_then(|v| {
                        if v.is_finite() {
                            Ok(v)
                        } else {
                            Err(parse_error(line_no, format!("non-finite value: {:?}", cell)))
                        }
                    })
            })
            .collect::<Result<Vec<f64>, IoError>>()?;

        if values.len() != expected {
            return Err(parse_error(
                line_no,
                format!("expected {} values, found {}", expected, values.len()),
            ));
        }
        row_names.push(first.to_string());
        rows.push(values);
    }

    let col_names = col_names.ok_or_else(|| IoError::MissingHeader {
        path: path.to_path_buf(),
    })?;
    let matrix = if rows.is_empty() {
        Matrix::new(0, col_names.len(), Vec::new())?
    } else {
        Matrix::from_rows(rows)?
    };
    info!("Found {} rows, {} columns", matrix.rows(), matrix.cols());

    Ok(LabeledMatrix {
        row_names,
        col_names,
        matrix,
    })
}

pub fn write_matrix(path: &Path, labeled: &LabeledMatrix) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_matrix_to(&mut out, labeled)
        .and_then(|_| out.flush())
        .map_err(|e| IoError::io(path, e))
}

fn write_matrix_to<W: Write>(out: &mut W, labeled: &LabeledMatrix) -> std::io::Result<()> {
    write!(out, "name")?;
    for name in &labeled.col_names {
        write!(out, "\t{}", name)?;
    }
    writeln!(out)?;
    for (name, row) in labeled.row_names.iter().zip(labeled.matrix.iter_rows()) {
        write!(out, "{}", name)?;
        for v in row {
            write!(out, "\t{}", v)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write `name<TAB>cluster` lines, one per name, in the given order.
pub fn write_clusters_tsv(
    path: &Path,
    names: &[String],
    order: &[usize],
    labels: &[usize],
) -> Result<(), IoError> {
    let mut content = String::from("name\tcluster\n");
    for &idx in order {
        content.push_str(&format!("{}\t{}\n", names[idx], labels[idx]));
    }
    std::fs::write(path, content).map_err(|e| IoError::io(path, e))?;
    info!("Cluster assignments saved to {:?}", path);
    Ok(())
}

fn name_refs(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}

#[derive(Serialize)]
struct AxisReport<'a> {
    names: Vec<&'a str>,
    #[serde(flatten)]
    axis: &'a AxisClustering,
}

#[derive(Serialize)]
struct Report<'a> {
    config: &'a ClusterConfig,
    rows: AxisReport<'a>,
    columns: Option<AxisReport<'a>>,
}

/// Write the full clustering result as pretty JSON. Names are in original
/// index order so `order` can index into them.
pub fn write_json(
    path: &Path,
    labeled: &LabeledMatrix,
    result: &MatrixClustering,
) -> Result<(), IoError> {
    let report = Report {
        config: &result.config,
        rows: AxisReport {
            names: name_refs(&labeled.row_names),
            axis: &result.rows,
        },
        columns: result.columns.as_ref().map(|axis| AxisReport {
            names: name_refs(&labeled.col_names),
            axis,
        }),
    };

    let file = File::create(path).map_err(|e| IoError::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &report)?;
    out.flush().map_err(|e| IoError::io(path, e))?;
    info!("Clustering result saved to {:?}", path);
    Ok(())
}
