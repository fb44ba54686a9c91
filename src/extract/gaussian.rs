//! Gaussian log extractor.
//!
//! Single pass over the log text. Quantities that Gaussian prints repeatedly (geometry, dipole,
//! Mulliken charges, basis count) keep their last occurrence; SCF energies and vibrational rows
//! accumulate in file order. Numbers Gaussian could not format (`*****`) become NaN and therefore
//! `null` in the output.

use std::path::Path;

use crate::error::ExtractionError;
use crate::extract::Extractor;
use crate::record::{Record, Value};

const BANNER_MARKERS: [&str; 2] = ["Entering Gaussian System", "Gaussian, Inc."];

/// Extractor for Gaussian 09/16 `.log` / `.out` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianExtractor;

impl Extractor for GaussianExtractor {
    fn extract(&self, path: &Path) -> Result<Record, ExtractionError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ExtractionError::new(path, format!("cannot read file: {e}")))?;
        let text = String::from_utf8_lossy(&bytes);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        parse_gaussian(&text, &file_name).map_err(|msg| ExtractionError::new(path, msg))
    }
}

/// Parse Gaussian output text into a record. `Err` holds a human-readable reason.
pub fn parse_gaussian(text: &str, file_name: &str) -> Result<Record, String> {
    if text.trim().is_empty() {
        return Err("file is empty".to_string());
    }
    if !BANNER_MARKERS.iter().any(|m| text.contains(m)) {
        return Err("unable to detect Gaussian output".to_string());
    }
    let scan = Scan::run(text);
    if scan.scf_energies.is_empty() && scan.geometry().is_none() {
        return Err("no SCF energies or geometry found".to_string());
    }
    Ok(scan.into_record(file_name))
}

/// Atom numbers and Cartesian coordinates (Å) of one orientation block.
#[derive(Clone, Debug, Default)]
struct Geometry {
    atom_numbers: Vec<i64>,
    coords: Vec<[f64; 3]>,
}

#[derive(Debug, Default)]
struct Scan {
    version: Option<String>,
    route: Option<String>,
    normal_termination: bool,
    charge: Option<f64>,
    multiplicity: Option<i64>,
    nbasis: Option<i64>,
    scf_energies: Vec<f64>,
    standard_geometry: Option<Geometry>,
    input_geometry: Option<Geometry>,
    frequencies: Vec<f64>,
    ir_intensities: Vec<f64>,
    force_constants: Vec<f64>,
    reduced_masses: Vec<f64>,
    dipole: Option<[f64; 3]>,
    mulliken: Option<Vec<f64>>,
    zpe: Option<f64>,
}

impl Scan {
    fn run(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut scan = Scan::default();
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let t = line.trim();

            if scan.version.is_none()
                && let Some(v) = parse_version(t)
            {
                scan.version = Some(v);
            } else if scan.route.is_none() && t.starts_with('#') {
                scan.route = Some(read_route(&lines, i));
            } else if t.starts_with("Normal termination") {
                scan.normal_termination = true;
            } else if scan.charge.is_none() && t.starts_with("Charge =") {
                let (c, m) = parse_charge_mult(t);
                scan.charge = c;
                scan.multiplicity = m;
            } else if t.contains("basis functions,") {
                if let Some(n) = t.split_whitespace().next().and_then(|s| s.parse().ok()) {
                    scan.nbasis = Some(n);
                }
            } else if let Some(rest) = t.strip_prefix("SCF Done:") {
                if let Some(e) = rest
                    .split_once('=')
                    .and_then(|(_, v)| v.split_whitespace().next())
                    .and_then(parse_float)
                {
                    scan.scf_energies.push(e);
                }
            } else if t.starts_with("Standard orientation:") {
                let (geom, end) = read_orientation(&lines, i);
                scan.standard_geometry = Some(geom);
                i = end;
                continue;
            } else if t.starts_with("Input orientation:") {
                let (geom, end) = read_orientation(&lines, i);
                scan.input_geometry = Some(geom);
                i = end;
                continue;
            } else if let Some(v) = labeled_values(t, "Frequencies") {
                scan.frequencies.extend(v);
            } else if let Some(v) = labeled_values(t, "IR Inten") {
                scan.ir_intensities.extend(v);
            } else if let Some(v) = labeled_values(t, "Frc consts") {
                scan.force_constants.extend(v);
            } else if let Some(v) = labeled_values(t, "Red. masses") {
                scan.reduced_masses.extend(v);
            } else if t.starts_with("Dipole moment (field-independent basis, Debye)") {
                if let Some(next) = lines.get(i + 1) {
                    scan.dipole = parse_dipole(next).or(scan.dipole);
                }
            } else if is_mulliken_header(t) {
                let (charges, end) = read_mulliken(&lines, i);
                if !charges.is_empty() {
                    scan.mulliken = Some(charges);
                }
                i = end;
                continue;
            } else if let Some(rest) = t.strip_prefix("Zero-point correction=") {
                scan.zpe = rest.split_whitespace().next().and_then(parse_float);
            }
            i += 1;
        }
        scan
    }

    fn geometry(&self) -> Option<&Geometry> {
        self.standard_geometry
            .as_ref()
            .or(self.input_geometry.as_ref())
            .filter(|g| !g.coords.is_empty())
    }

    fn into_record(self, file_name: &str) -> Record {
        let geometry = self.geometry().cloned();
        let final_scf = self.scf_energies.last().copied();
        let non_empty = |v: Vec<f64>| (!v.is_empty()).then_some(v);

        let metadata = Value::map([
            ("package", Value::from("Gaussian")),
            ("package_version", Value::from(self.version)),
            ("route", Value::from(self.route)),
            ("success", Value::from(self.normal_termination)),
        ]);
        let vibrations = Value::map([
            ("frequencies_cm-1", non_empty(self.frequencies)),
            ("ir_intensities_km/mol", non_empty(self.ir_intensities)),
            ("force_constants_mDyneA", non_empty(self.force_constants)),
            ("reduced_masses_amu", non_empty(self.reduced_masses)),
        ]);
        let dipole = self.dipole.map(|[x, y, z]| {
            Value::map([
                ("x", x),
                ("y", y),
                ("z", z),
                ("total", (x * x + y * y + z * z).sqrt()),
            ])
        });

        let mut record = Record::new();
        record
            .insert("file", file_name)
            .insert("metadata", metadata)
            .insert("charge", self.charge)
            .insert("multiplicity", self.multiplicity)
            .insert("nbasis", self.nbasis)
            .insert("natoms", geometry.as_ref().map(|g| g.coords.len()))
            .insert("scf_energies_au", non_empty(self.scf_energies))
            .insert("final_scf_energy_au", final_scf)
            .insert("vibrations", vibrations)
            .insert("dipole_moment_debye", dipole)
            .insert("mulliken_charges", self.mulliken)
            .insert("zpe_au", self.zpe)
            .insert(
                "atom_numbers",
                geometry.as_ref().map(|g| g.atom_numbers.clone()),
            )
            .insert(
                "final_geometry_angstrom",
                geometry.map(|g| {
                    g.coords
                        .into_iter()
                        .map(|c| c.to_vec())
                        .collect::<Vec<_>>()
                }),
            );
        record
    }
}

/// Accepts Fortran `D` exponents. Overflowed fields (`****`) parse as NaN.
fn parse_float(s: &str) -> Option<f64> {
    if !s.is_empty() && s.chars().all(|c| c == '*') {
        return Some(f64::NAN);
    }
    s.replace(['D', 'd'], "E").parse().ok()
}

/// `Gaussian 16:  ES64L-G16RevC.01  3-Jul-2019` -> `16revC.01`.
fn parse_version(t: &str) -> Option<String> {
    let rest = t.strip_prefix("Gaussian ")?;
    let (major, tail) = rest.split_once(':')?;
    let major = major.trim();
    if major.is_empty() || !major.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let revision = tail
        .split_whitespace()
        .find_map(|tok| tok.split_once("Rev").map(|(_, r)| r.to_string()));
    Some(match revision {
        Some(r) if !r.is_empty() => format!("{major}rev{r}"),
        _ => major.to_string(),
    })
}

/// Route section: the `#` line plus continuation lines up to the closing dashes.
fn read_route(lines: &[&str], start: usize) -> String {
    lines[start..]
        .iter()
        .map(|l| l.trim())
        .take_while(|l| !l.starts_with("---"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Charge =  0 Multiplicity = 1`
fn parse_charge_mult(t: &str) -> (Option<f64>, Option<i64>) {
    let tokens: Vec<&str> = t.split_whitespace().collect();
    let after = |label: &str| {
        tokens
            .iter()
            .position(|tok| *tok == label)
            .and_then(|p| tokens.get(p + 2))
    };
    (
        after("Charge").and_then(|s| parse_float(s)),
        after("Multiplicity").and_then(|s| s.parse().ok()),
    )
}

/// Orientation table: title, dashes, two header lines, dashes, rows, dashes.
/// Returns the geometry and the index just past the closing dashes.
fn read_orientation(lines: &[&str], start: usize) -> (Geometry, usize) {
    let mut geom = Geometry::default();
    let mut i = start + 5;
    while let Some(line) = lines.get(i) {
        i += 1;
        if line.trim_start().starts_with("---") {
            break;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 5 {
            break;
        }
        let n = tokens.len();
        let coords = [
            parse_float(tokens[n - 3]),
            parse_float(tokens[n - 2]),
            parse_float(tokens[n - 1]),
        ];
        match (tokens[1].parse::<i64>(), coords) {
            (Ok(z), [Some(x), Some(y), Some(zc)]) => {
                geom.atom_numbers.push(z);
                geom.coords.push([x, y, zc]);
            }
            _ => break,
        }
    }
    (geom, i.min(lines.len()))
}

/// Values after `<label> --` (the high-precision `---` rows are skipped).
fn labeled_values(t: &str, label: &str) -> Option<Vec<f64>> {
    let rest = t.strip_prefix(label)?.trim_start().strip_prefix("--")?;
    if rest.starts_with('-') {
        return None;
    }
    Some(
        rest.split_whitespace()
            .map(|s| parse_float(s).unwrap_or(f64::NAN))
            .collect(),
    )
}

/// `X=  0.0000  Y=  0.0000  Z= -2.1  Tot=  2.1`
fn parse_dipole(line: &str) -> Option<[f64; 3]> {
    let spaced = line.replace('=', "= ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    let value = |label: &str| {
        tokens
            .iter()
            .position(|tok| *tok == label)
            .and_then(|p| tokens.get(p + 1))
            .and_then(|s| parse_float(s))
    };
    Some([value("X=")?, value("Y=")?, value("Z=")?])
}

fn is_mulliken_header(t: &str) -> bool {
    t == "Mulliken charges:"
        || t == "Mulliken atomic charges:"
        || t.starts_with("Mulliken charges and spin densities:")
}

/// Header, column-index line, then `idx element charge [spin]` rows until `Sum of Mulliken`.
fn read_mulliken(lines: &[&str], start: usize) -> (Vec<f64>, usize) {
    let mut charges = Vec::new();
    let mut i = start + 2;
    while let Some(line) = lines.get(i) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.get(2).and_then(|s| parse_float(s)) {
            Some(q) if tokens[0].parse::<usize>().is_ok() => charges.push(q),
            _ => break,
        }
        i += 1;
    }
    (charges, i.min(lines.len()))
}
