//! Decoder for PCD (Point Cloud Data) uploads.
//!
//! Supports PCD v0.7 with `ascii` and `binary` (little-endian) encodings,
//! reading the `x`/`y`/`z` FLOAT32 fields and skipping whatever else a
//! cloud carries (rgb, intensity, normals). `binary_compressed` is not
//! supported.

use glam::Vec3;
use thiserror::Error;

/// Errors from decoding a PCD upload. All of these are caller input
/// problems; the request fails cleanly and is never retried.
#[derive(Debug, Error)]
pub enum PcdError {
    #[error("header is not valid UTF-8 at line {0}")]
    InvalidHeaderText(usize),
    #[error("malformed header at line {line}: {msg}")]
    MalformedHeader { line: usize, msg: String },
    #[error("missing header entry: {0}")]
    MissingHeader(&'static str),
    #[error("unsupported data encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("cloud does not carry float x/y/z fields")]
    MissingCoordinates,
    #[error("malformed point at line {line}: {msg}")]
    MalformedPoint { line: usize, msg: String },
    #[error("file truncated: expected {expected} points, found {found}")]
    Truncated { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Binary,
}

#[derive(Debug)]
struct Field {
    name: String,
    size: usize,
    count: usize,
    is_float: bool,
}

#[derive(Debug)]
struct Header {
    fields: Vec<Field>,
    points: usize,
    encoding: Encoding,
    /// Byte offset of the first record after the DATA line.
    data_start: usize,
    /// Line number of the DATA line, for point error reporting.
    data_line: usize,
}

/// Where the x/y/z coordinates sit within one point record.
struct Layout {
    token: [usize; 3],
    byte: [usize; 3],
    tokens_per_point: usize,
    stride: usize,
}

/// Decodes a PCD file into its finite points. NaN/inf coordinates (PCD's
/// invalid-point markers) are dropped.
pub fn parse(bytes: &[u8]) -> Result<Vec<Vec3>, PcdError> {
    let header = parse_header(bytes)?;
    match header.encoding {
        Encoding::Ascii => parse_ascii(bytes, &header),
        Encoding::Binary => parse_binary(bytes, &header),
    }
}

fn parse_header(bytes: &[u8]) -> Result<Header, PcdError> {
    let mut names: Option<Vec<String>> = None;
    let mut sizes: Option<Vec<usize>> = None;
    let mut types: Option<Vec<char>> = None;
    let mut counts: Option<Vec<usize>> = None;
    let mut width: Option<usize> = None;
    let mut height: Option<usize> = None;
    let mut points: Option<usize> = None;

    let mut pos = 0;
    let mut line_no = 0;
    while pos < bytes.len() {
        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |i| pos + i);
        line_no += 1;
        let line = std::str::from_utf8(&bytes[pos..end])
            .map_err(|_| PcdError::InvalidHeaderText(line_no))?
            .trim_end_matches('\r')
            .trim();
        let next = end + 1;

        if line.is_empty() || line.starts_with('#') {
            pos = next;
            continue;
        }

        let mut tokens = line.split_whitespace();
        let key = tokens.next().unwrap_or_default();
        let rest: Vec<&str> = tokens.collect();
        match key {
            "VERSION" | "VIEWPOINT" => {}
            "FIELDS" | "COLUMNS" => names = Some(rest.iter().map(|s| s.to_string()).collect()),
            "SIZE" => sizes = Some(parse_integers(&rest, line_no, "SIZE")?),
            "TYPE" => types = Some(rest.iter().filter_map(|t| t.chars().next()).collect()),
            "COUNT" => counts = Some(parse_integers(&rest, line_no, "COUNT")?),
            "WIDTH" => width = Some(parse_integer(&rest, line_no, "WIDTH")?),
            "HEIGHT" => height = Some(parse_integer(&rest, line_no, "HEIGHT")?),
            "POINTS" => points = Some(parse_integer(&rest, line_no, "POINTS")?),
            "DATA" => {
                let encoding = match rest.first().copied() {
                    Some("ascii") => Encoding::Ascii,
                    Some("binary") => Encoding::Binary,
                    Some(other) => return Err(PcdError::UnsupportedEncoding(other.to_string())),
                    None => {
                        return Err(PcdError::MalformedHeader {
                            line: line_no,
                            msg: "DATA without an encoding".into(),
                        })
                    }
                };

                let names = names.ok_or(PcdError::MissingHeader("FIELDS"))?;
                let sizes = sizes.ok_or(PcdError::MissingHeader("SIZE"))?;
                let types = types.ok_or(PcdError::MissingHeader("TYPE"))?;
                let counts = counts.unwrap_or_else(|| vec![1; names.len()]);
                if sizes.len() != names.len()
                    || types.len() != names.len()
                    || counts.len() != names.len()
                {
                    return Err(PcdError::MalformedHeader {
                        line: line_no,
                        msg: "FIELDS/SIZE/TYPE/COUNT lengths disagree".into(),
                    });
                }

                let points = points
                    .or_else(|| Some(width? * height?))
                    .ok_or(PcdError::MissingHeader("POINTS"))?;

                let fields = names
                    .into_iter()
                    .zip(sizes)
                    .zip(types.into_iter().zip(counts))
                    .map(|((name, size), (ty, count))| Field {
                        name,
                        size,
                        count,
                        is_float: ty == 'F',
                    })
                    .collect();

                return Ok(Header {
                    fields,
                    points,
                    encoding,
                    data_start: next,
                    data_line: line_no,
                });
            }
            // Unknown header entries are skipped.
            _ => {}
        }
        pos = next;
    }

    Err(PcdError::MissingHeader("DATA"))
}

fn parse_integer(tokens: &[&str], line: usize, key: &str) -> Result<usize, PcdError> {
    tokens
        .first()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| PcdError::MalformedHeader {
            line,
            msg: format!("{key} expects one integer"),
        })
}

fn parse_integers(tokens: &[&str], line: usize, key: &str) -> Result<Vec<usize>, PcdError> {
    tokens
        .iter()
        .map(|t| {
            t.parse().map_err(|_| PcdError::MalformedHeader {
                line,
                msg: format!("{key} expects integers"),
            })
        })
        .collect()
}

fn coordinate_layout(fields: &[Field]) -> Result<Layout, PcdError> {
    let mut token = [usize::MAX; 3];
    let mut byte = [usize::MAX; 3];
    let mut token_off = 0;
    let mut byte_off = 0;

    for field in fields {
        let axis = match field.name.as_str() {
            "x" => Some(0),
            "y" => Some(1),
            "z" => Some(2),
            _ => None,
        };
        if let Some(axis) = axis {
            if !field.is_float || field.size != 4 || field.count != 1 {
                return Err(PcdError::MissingCoordinates);
            }
            token[axis] = token_off;
            byte[axis] = byte_off;
        }
        token_off += field.count;
        byte_off += field.size * field.count;
    }

    if token.contains(&usize::MAX) {
        return Err(PcdError::MissingCoordinates);
    }
    Ok(Layout {
        token,
        byte,
        tokens_per_point: token_off,
        stride: byte_off,
    })
}

fn parse_ascii(bytes: &[u8], header: &Header) -> Result<Vec<Vec3>, PcdError> {
    let layout = coordinate_layout(&header.fields)?;
    let body = std::str::from_utf8(&bytes[header.data_start.min(bytes.len())..]).map_err(|_| {
        PcdError::MalformedPoint {
            line: header.data_line + 1,
            msg: "body is not valid UTF-8".into(),
        }
    })?;

    // The header's point count is attacker-controlled; never allocate from
    // it directly. A record is at least 2 bytes per column.
    let upper_bound = body.len() / (2 * layout.tokens_per_point);
    let mut points = Vec::with_capacity(header.points.min(upper_bound));
    let mut parsed = 0;
    for (offset, line) in body.lines().enumerate() {
        if parsed == header.points {
            break;
        }
        let line_no = header.data_line + 1 + offset;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() < layout.tokens_per_point {
            return Err(PcdError::MalformedPoint {
                line: line_no,
                msg: format!(
                    "expected {} columns, found {}",
                    layout.tokens_per_point,
                    tokens.len()
                ),
            });
        }

        let mut coords = [0.0f32; 3];
        for axis in 0..3 {
            let raw = tokens[layout.token[axis]];
            coords[axis] = raw.parse().map_err(|_| PcdError::MalformedPoint {
                line: line_no,
                msg: format!("bad float {raw:?}"),
            })?;
        }
        parsed += 1;
        push_finite(&mut points, coords);
    }

    if parsed < header.points {
        return Err(PcdError::Truncated {
            expected: header.points,
            found: parsed,
        });
    }
    Ok(points)
}

fn parse_binary(bytes: &[u8], header: &Header) -> Result<Vec<Vec3>, PcdError> {
    let layout = coordinate_layout(&header.fields)?;
    let body = bytes.get(header.data_start..).unwrap_or_default();
    // Checking against the records actually present bounds the count before
    // any allocation or size arithmetic can overflow on a hostile header.
    let available = body.len() / layout.stride;
    if available < header.points {
        return Err(PcdError::Truncated {
            expected: header.points,
            found: available,
        });
    }
    let needed = header.points * layout.stride;

    let mut points = Vec::with_capacity(header.points);
    for record in body[..needed].chunks_exact(layout.stride) {
        let mut coords = [0.0f32; 3];
        for axis in 0..3 {
            let off = layout.byte[axis];
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&record[off..off + 4]);
            coords[axis] = f32::from_le_bytes(raw);
        }
        push_finite(&mut points, coords);
    }
    Ok(points)
}

fn push_finite(points: &mut Vec<Vec3>, coords: [f32; 3]) {
    let [x, y, z] = coords;
    if x.is_finite() && y.is_finite() && z.is_finite() {
        points.push(Vec3::new(x, y, z));
    }
}
