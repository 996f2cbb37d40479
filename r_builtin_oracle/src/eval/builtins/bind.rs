//! `cbind` / `rbind`: matrix assembly with recycling.
//!
//! Arguments are coerced to their common type, split into scalar cells,
//! placed into a column-major grid, and reassembled. NULLs and
//! zero-length vectors are dropped.

use crate::condition::EvalError;
use crate::eval::{CallArgs, EvalContext};
use crate::value::{RData, RValue};

use super::coerce::{coerce_vector, common_type, concat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Columns,
    Rows,
}

pub fn cbind(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    bind(ctx, args, Axis::Columns)
}

pub fn rbind(ctx: &mut EvalContext, args: &CallArgs) -> Result<RValue, EvalError> {
    bind(ctx, args, Axis::Rows)
}

struct BindArg {
    /// 1-based position in the original call, for warning text.
    position: usize,
    name: Option<String>,
    value: RValue,
}

/// The `(nrow, ncol)` of a matrix argument. Anything without exactly two
/// dim entries (including 1-d arrays) binds as a plain vector.
fn matrix_shape(value: &RValue) -> Option<(usize, usize)> {
    match value.dim()?.as_slice() {
        [nrow, ncol] => Some((*nrow, *ncol)),
        _ => None,
    }
}

fn bind(ctx: &mut EvalContext, args: &CallArgs, axis: Axis) -> Result<RValue, EvalError> {
    let kept: Vec<BindArg> = args
        .values
        .iter()
        .zip(&args.names)
        .enumerate()
        .filter(|(_, (v, _))| !v.is_empty())
        .map(|(i, (v, n))| BindArg {
            position: i + 1,
            name: n.clone(),
            value: v.clone(),
        })
        .collect();
    if kept.is_empty() {
        return Ok(RValue::null());
    }

    // The bound extent: rows for cbind, columns for rbind. Matrices fix
    // it; otherwise the longest vector does.
    let matrix_extent = kept
        .iter()
        .filter_map(|a| matrix_shape(&a.value))
        .map(|(nrow, ncol)| match axis {
            Axis::Columns => nrow,
            Axis::Rows => ncol,
        })
        .collect::<Vec<usize>>();
    let extent = match matrix_extent.first() {
        Some(first) => {
            if matrix_extent.iter().any(|e| e != first) {
                let what = match axis {
                    Axis::Columns => "rows",
                    Axis::Rows => "columns",
                };
                return Err(ctx.error(format!("number of {} of matrices must match", what)));
            }
            *first
        }
        None => kept.iter().map(|a| a.value.len()).max().unwrap_or(0),
    };

    let values: Vec<RValue> = kept.iter().map(|a| a.value.clone()).collect();
    let target = common_type(ctx, &values)?;

    // Lay every argument out as whole columns (cbind) or rows (rbind)
    // of scalar cells, recycling vectors to the bound extent.
    let mut lanes: Vec<Vec<RValue>> = Vec::new();
    for arg in &kept {
        let cells = scalar_cells(&coerce_vector(ctx, &arg.value, target)?);
        match matrix_shape(&arg.value) {
            Some((nrow, ncol)) => {
                match axis {
                    Axis::Columns => {
                        for col in 0..ncol {
                            lanes.push(cells[col * nrow..(col + 1) * nrow].to_vec());
                        }
                    }
                    Axis::Rows => {
                        for row in 0..nrow {
                            lanes.push(
                                (0..ncol).map(|col| cells[col * nrow + row].clone()).collect(),
                            );
                        }
                    }
                }
            }
            None => {
                if extent % cells.len() != 0 {
                    let what = match axis {
                        Axis::Columns => "rows",
                        Axis::Rows => "columns",
                    };
                    ctx.warn(format!(
                        "number of {} of result is not a multiple of vector length (arg {})",
                        what, arg.position
                    ));
                }
                lanes.push((0..extent).map(|i| cells[i % cells.len()].clone()).collect());
            }
        }
    }

    let (nrow, ncol) = match axis {
        Axis::Columns => (extent, lanes.len()),
        Axis::Rows => (lanes.len(), extent),
    };

    // Column-major assembly.
    let mut grid: Vec<RValue> = Vec::with_capacity(nrow * ncol);
    match axis {
        Axis::Columns => {
            for lane in &lanes {
                grid.extend(lane.iter().cloned());
            }
        }
        Axis::Rows => {
            for col in 0..ncol {
                for lane in &lanes {
                    grid.push(lane[col].clone());
                }
            }
        }
    }

    let names = vec![None; grid.len()];
    let mut out = concat(ctx, &grid, &names)?;
    if grid.is_empty() {
        // A typed empty matrix still needs a typed payload.
        out = RValue::new(coerce_vector(ctx, &RValue::null(), target)?);
    }
    out = out
        .with_attr(
            "dim",
            RValue::int(vec![Some(nrow as i32), Some(ncol as i32)]),
        )
        .map_err(|e| ctx.error(e.to_string()))?;

    if let Some(dimnames) = bound_dimnames(&kept, axis, nrow, ncol) {
        out = out
            .with_attr("dimnames", dimnames)
            .map_err(|e| ctx.error(e.to_string()))?;
    }
    Ok(out)
}

fn scalar_cells(data: &RData) -> Vec<RValue> {
    match data {
        RData::Null => Vec::new(),
        RData::Logical(v) => v.iter().map(|e| RValue::logical(vec![*e])).collect(),
        RData::Int(v) => v.iter().map(|e| RValue::int(vec![*e])).collect(),
        RData::Double(v) => v.iter().map(|e| RValue::dbl1(*e)).collect(),
        RData::Complex(v) => v.iter().map(|z| RValue::complex(vec![*z])).collect(),
        RData::Character(v) => v.iter().map(|e| RValue::character(vec![e.clone()])).collect(),
        RData::Raw(v) => v.iter().map(|b| RValue::raw(vec![*b])).collect(),
        RData::List(v) => v.clone(),
        RData::Closure(_) => vec![RValue::new(data.clone())],
    }
}

/// Dimnames for the bound matrix: each vector argument contributes its
/// call-arg name along the bound axis, matrices contribute their
/// existing labels. No labels anywhere means no `dimnames` attribute.
fn bound_dimnames(kept: &[BindArg], axis: Axis, nrow: usize, ncol: usize) -> Option<RValue> {
    let mut labels: Vec<Option<String>> = Vec::new();
    for arg in kept {
        match matrix_shape(&arg.value) {
            Some((nrow, ncol)) => {
                let span = match axis {
                    Axis::Columns => ncol,
                    Axis::Rows => nrow,
                };
                let axis_index = match axis {
                    Axis::Columns => 1,
                    Axis::Rows => 0,
                };
                let existing = matrix_axis_labels(&arg.value, axis_index, span);
                labels.extend(existing);
            }
            None => labels.push(arg.name.clone()),
        }
    }
    if labels.iter().all(|l| l.is_none()) {
        return None;
    }
    let labels = RValue::character(
        labels
            .into_iter()
            .map(|l| Some(l.unwrap_or_default()))
            .collect(),
    );
    let expected = match axis {
        Axis::Columns => ncol,
        Axis::Rows => nrow,
    };
    if labels.len() != expected {
        return None;
    }
    let dimnames = match axis {
        Axis::Columns => vec![RValue::null(), labels],
        Axis::Rows => vec![labels, RValue::null()],
    };
    Some(RValue::list(dimnames))
}

fn matrix_axis_labels(matrix: &RValue, axis_index: usize, span: usize) -> Vec<Option<String>> {
    let fallback = vec![None; span];
    let Some(dimnames) = matrix.attr("dimnames") else {
        return fallback;
    };
    let RData::List(entries) = &dimnames.data else {
        return fallback;
    };
    match entries.get(axis_index).map(|e| &e.data) {
        Some(RData::Character(names)) if names.len() == span => names
            .iter()
            .map(|n| n.clone().filter(|s| !s.is_empty()))
            .collect(),
        _ => fallback,
    }
}
