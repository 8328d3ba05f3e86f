//! ASCII and binary STL parsing into a [`Mesh`].

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use tracing::{debug, warn};

use crate::error::{Result, SlicerError};
use crate::mesh::store::Mesh;

const BINARY_HEADER_LEN: usize = 80;
const BINARY_RECORD_LEN: usize = 50;
const COLLINEAR_EPS_RAD: f64 = 1e-8;

/// Statistics gathered while reading, independent of manifold checking.
#[derive(Debug, Clone, Default)]
pub struct ReadStats {
    pub facets_read: usize,
    pub facets_skipped_degenerate: usize,
    pub facets_skipped_malformed: usize,
}

/// Reads an STL file (ASCII or binary, auto-detected) into a fresh [`Mesh`].
pub fn read_stl(path: impl AsRef<Path>, z_quantum: f64) -> Result<(Mesh, ReadStats)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(SlicerError::StlIo)?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(SlicerError::StlIo)?;

    let mut mesh = Mesh::new(z_quantum);
    let stats = if is_ascii(&mmap) {
        debug!(path = %path.display(), "detected ASCII STL");
        read_ascii(&mmap, &mut mesh)
    } else {
        debug!(path = %path.display(), "detected binary STL");
        read_binary(&mmap, &mut mesh)?
    };
    Ok((mesh, stats))
}

/// An ASCII STL starts with `solid ` (case-insensitive) and is human
/// readable; a binary file occasionally also starts with `solid` in its
/// header text, so this additionally checks that the bytes that follow look
/// like printable text rather than binary record data.
fn is_ascii(bytes: &[u8]) -> bool {
    if bytes.len() < 6 {
        return false;
    }
    let prefix = &bytes[..6];
    if !prefix.eq_ignore_ascii_case(b"solid ") {
        return false;
    }
    let sample_len = bytes.len().min(512);
    bytes[..sample_len]
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..0x7f).contains(&b))
}

fn read_binary(bytes: &[u8], mesh: &mut Mesh) -> Result<ReadStats> {
    let mut stats = ReadStats::default();
    if bytes.len() < BINARY_HEADER_LEN + 4 {
        return Ok(stats);
    }
    let mut cursor = Cursor::new(&bytes[BINARY_HEADER_LEN..]);
    let facet_count = cursor.read_u32::<LittleEndian>().map_err(SlicerError::StlIo)? as usize;
    let body = &bytes[BINARY_HEADER_LEN + 4..];
    let available = body.len() / BINARY_RECORD_LEN;
    let n = facet_count.min(available);
    if facet_count > available {
        warn!(
            declared = facet_count,
            available, "binary STL facet count exceeds file size, truncating"
        );
    }
    for i in 0..n {
        let rec = &body[i * BINARY_RECORD_LEN..(i + 1) * BINARY_RECORD_LEN];
        let mut c = Cursor::new(rec);
        let read3 = |c: &mut Cursor<&[u8]>| -> std::io::Result<(f64, f64, f64)> {
            Ok((
                c.read_f32::<LittleEndian>()? as f64,
                c.read_f32::<LittleEndian>()? as f64,
                c.read_f32::<LittleEndian>()? as f64,
            ))
        };
        let normal = match read3(&mut c) {
            Ok(v) => v,
            Err(_) => {
                stats.facets_skipped_malformed += 1;
                continue;
            }
        };
        let v1 = read3(&mut c);
        let v2 = read3(&mut c);
        let v3 = read3(&mut c);
        let (v1, v2, v3) = match (v1, v2, v3) {
            (Ok(a), Ok(b), Ok(c)) => (a, b, c),
            _ => {
                stats.facets_skipped_malformed += 1;
                continue;
            }
        };
        stats.facets_read += 1;
        if !try_add_facet(mesh, v1, v2, v3, normal) {
            stats.facets_skipped_degenerate += 1;
        }
    }
    Ok(stats)
}

/// Whitespace-delimited ASCII grammar:
/// `facet normal nx ny nz / outer loop / vertex x y z (x3) / endloop / endfacet`,
/// terminated by `endsolid`. Malformed blocks are skipped by scanning ahead
/// to the next `facet` keyword.
fn read_ascii(bytes: &[u8], mesh: &mut Mesh) -> ReadStats {
    let mut stats = ReadStats::default();
    let text = String::from_utf8_lossy(bytes);
    let mut tokens = text.split_ascii_whitespace().peekable();

    // Skip the leading `solid <name>` line's tokens up to the first `facet`.
    while let Some(&tok) = tokens.peek() {
        if tok.eq_ignore_ascii_case("facet") || tok.eq_ignore_ascii_case("endsolid") {
            break;
        }
        tokens.next();
    }

    loop {
        match tokens.next() {
            None => break,
            Some(tok) if tok.eq_ignore_ascii_case("endsolid") => break,
            Some(tok) if tok.eq_ignore_ascii_case("facet") => {
                match parse_facet_block(&mut tokens) {
                    Some((normal, v1, v2, v3)) => {
                        stats.facets_read += 1;
                        if !try_add_facet(mesh, v1, v2, v3, normal) {
                            stats.facets_skipped_degenerate += 1;
                        }
                    }
                    None => {
                        stats.facets_skipped_malformed += 1;
                        skip_to_next_facet(&mut tokens);
                    }
                }
            }
            Some(_) => continue,
        }
    }
    stats
}

type Vec3 = (f64, f64, f64);

fn parse_facet_block<'a, I: Iterator<Item = &'a str>>(
    tokens: &mut std::iter::Peekable<I>,
) -> Option<(Vec3, Vec3, Vec3, Vec3)> {
    if !tokens.next()?.eq_ignore_ascii_case("normal") {
        return None;
    }
    let normal = parse_vec3(tokens)?;
    if !tokens.next()?.eq_ignore_ascii_case("outer") {
        return None;
    }
    if !tokens.next()?.eq_ignore_ascii_case("loop") {
        return None;
    }
    let mut verts = [(0.0, 0.0, 0.0); 3];
    for v in verts.iter_mut() {
        if !tokens.next()?.eq_ignore_ascii_case("vertex") {
            return None;
        }
        *v = parse_vec3(tokens)?;
    }
    if !tokens.next()?.eq_ignore_ascii_case("endloop") {
        return None;
    }
    if !tokens.next()?.eq_ignore_ascii_case("endfacet") {
        return None;
    }
    Some((normal, verts[0], verts[1], verts[2]))
}

fn parse_vec3<'a, I: Iterator<Item = &'a str>>(tokens: &mut I) -> Option<Vec3> {
    let x: f64 = tokens.next()?.parse().ok()?;
    let y: f64 = tokens.next()?.parse().ok()?;
    let z: f64 = tokens.next()?.parse().ok()?;
    Some((x, y, z))
}

fn skip_to_next_facet<'a, I: Iterator<Item = &'a str>>(tokens: &mut std::iter::Peekable<I>) {
    while let Some(&tok) = tokens.peek() {
        if tok.eq_ignore_ascii_case("facet") || tok.eq_ignore_ascii_case("endsolid") {
            return;
        }
        tokens.next();
    }
}

/// Adds a facet unless it is degenerate: two vertices coincide after
/// quantization, or the two edges emanating from v2 are collinear within
/// 1e-8 rad. Returns `false` (and adds nothing) when the facet is dropped.
fn try_add_facet(mesh: &mut Mesh, v1: Vec3, v2: Vec3, v3: Vec3, normal: Vec3) -> bool {
    let q = |v: Vec3| -> Vec3 {
        (
            crate::geometry::quantize_step(v.0, crate::geometry::XY_QUANTUM),
            crate::geometry::quantize_step(v.1, crate::geometry::XY_QUANTUM),
            crate::geometry::quantize_step(v.2, crate::geometry::DEFAULT_Z_QUANTUM),
        )
    };
    let (qv1, qv2, qv3) = (q(v1), q(v2), q(v3));
    if coincide(qv1, qv2) || coincide(qv2, qv3) || coincide(qv3, qv1) {
        return false;
    }
    if collinear_at_v2(qv1, qv2, qv3) {
        return false;
    }
    mesh.add_facet(v1, v2, v3, normal);
    true
}

fn coincide(a: Vec3, b: Vec3) -> bool {
    (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9 && (a.2 - b.2).abs() < 1e-9
}

fn collinear_at_v2(v1: Vec3, v2: Vec3, v3: Vec3) -> bool {
    let e1 = (v1.0 - v2.0, v1.1 - v2.1, v1.2 - v2.2);
    let e2 = (v3.0 - v2.0, v3.1 - v2.1, v3.2 - v2.2);
    let len1 = (e1.0 * e1.0 + e1.1 * e1.1 + e1.2 * e1.2).sqrt();
    let len2 = (e2.0 * e2.0 + e2.1 * e2.1 + e2.2 * e2.2).sqrt();
    if len1 < 1e-12 || len2 < 1e-12 {
        return true;
    }
    let dot = e1.0 * e2.0 + e1.1 * e2.1 + e1.2 * e2.2;
    let cos_angle = (dot / (len1 * len2)).clamp(-1.0, 1.0);
    let angle = cos_angle.acos();
    angle < COLLINEAR_EPS_RAD || (std::f64::consts::PI - angle) < COLLINEAR_EPS_RAD
}

#[allow(dead_code)]
fn read_file_fallback(path: &Path) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut buf))
        .map_err(SlicerError::StlIo)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ascii_cube() -> String {
        let mut s = String::from("solid cube\n");
        let faces = [
            [(0.0, 0.0, 0.0), (1.0, 1.0, 0.0), (1.0, 0.0, 0.0)],
            [(0.0, 0.0, 0.0), (0.0, 1.0, 0.0), (1.0, 1.0, 0.0)],
        ];
        for f in faces {
            s.push_str("facet normal 0 0 -1\nouter loop\n");
            for v in f {
                s.push_str(&format!("vertex {} {} {}\n", v.0, v.1, v.2));
            }
            s.push_str("endloop\nendfacet\n");
        }
        s.push_str("endsolid cube\n");
        s
    }

    #[test]
    fn detects_ascii_prefix() {
        let bytes = ascii_cube().into_bytes();
        assert!(is_ascii(&bytes));
    }

    #[test]
    fn ascii_reader_parses_two_facets() {
        let bytes = ascii_cube().into_bytes();
        let mut mesh = Mesh::new(1e-3);
        let stats = read_ascii(&bytes, &mut mesh);
        assert_eq!(stats.facets_read, 2);
        assert_eq!(stats.facets_skipped_degenerate, 0);
        assert_eq!(mesh.facets.len(), 2);
    }

    #[test]
    fn ascii_reader_skips_degenerate_facet() {
        let mut s = String::from("solid d\nfacet normal 0 0 1\nouter loop\n");
        s.push_str("vertex 0 0 0\nvertex 0 0 0\nvertex 1 0 0\n");
        s.push_str("endloop\nendfacet\nendsolid d\n");
        let mut mesh = Mesh::new(1e-3);
        let stats = read_ascii(s.as_bytes(), &mut mesh);
        assert_eq!(stats.facets_read, 1);
        assert_eq!(stats.facets_skipped_degenerate, 1);
        assert!(mesh.is_empty());
    }

    #[test]
    fn ascii_reader_recovers_from_malformed_block() {
        let mut s = String::from("solid d\nfacet normal 0 0 1\nouter loop\ngarbage\nendfacet\n");
        s.push_str("facet normal 0 0 1\nouter loop\n");
        s.push_str("vertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\n");
        s.push_str("endloop\nendfacet\nendsolid d\n");
        let mut mesh = Mesh::new(1e-3);
        let stats = read_ascii(s.as_bytes(), &mut mesh);
        assert_eq!(stats.facets_skipped_malformed, 1);
        assert_eq!(mesh.facets.len(), 1);
    }

    #[test]
    fn binary_round_trip_via_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.stl");
        let mut f = File::create(&path).unwrap();
        f.write_all(&[0u8; BINARY_HEADER_LEN]).unwrap();
        f.write_all(&1u32.to_le_bytes()).unwrap();
        let floats: [f32; 12] = [
            0.0, 0.0, 1.0, // normal
            0.0, 0.0, 0.0, // v1
            1.0, 0.0, 0.0, // v2
            0.0, 1.0, 0.0, // v3
        ];
        for v in floats {
            f.write_all(&v.to_le_bytes()).unwrap();
        }
        f.write_all(&0u16.to_le_bytes()).unwrap();
        drop(f);

        let (mesh, stats) = read_stl(&path, 1e-3).unwrap();
        assert_eq!(stats.facets_read, 1);
        assert_eq!(mesh.facets.len(), 1);
    }
}
