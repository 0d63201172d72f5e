//! The `.integrons` table.
//!
//! One row per element. Integrons are numbered `integron_01`, `integron_02`…
//! by their leftmost position on the replicon.

use crate::libs::error::Error;
use crate::libs::hit::{Hit, Strand};
use crate::libs::integron::{Integron, IntegronType};
use indexmap::IndexMap;
use itertools::Itertools;
use log::warn;
use std::cmp::Ordering;
use std::io::{BufRead, Write};

pub const HEADER: [&str; 13] = [
    "ID_integron",
    "ID_replicon",
    "element",
    "pos_beg",
    "pos_end",
    "strand",
    "evalue",
    "type_elt",
    "annotation",
    "model",
    "type",
    "default",
    "distance_2attC",
];

pub const NO_INTEGRON: &str = "# No Integron found";

/// A row of the `.integrons` table
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub integron: String,
    pub replicon: String,
    pub element: String,
    pub pos_beg: u64,
    pub pos_end: u64,
    pub strand: Strand,
    pub evalue: Option<f64>,
    pub type_elt: String,
    pub annotation: String,
    pub model: String,
    pub kind: IntegronType,
    pub default: bool,
    pub distance: Option<u64>,
}

/// `%.3e` with a signed, two-digit exponent
///
/// ```
/// # use integron::libs::report::format_evalue;
/// assert_eq!(format_evalue(1.2e-5), "1.200e-05");
/// assert_eq!(format_evalue(8.4e-150), "8.400e-150");
/// assert_eq!(format_evalue(0.0), "0.000e+00");
/// assert_eq!(format_evalue(12.0), "1.200e+01");
/// ```
pub fn format_evalue(evalue: f64) -> String {
    let s = format!("{:.3e}", evalue);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => s,
    }
}

fn parse_kind(s: &str) -> Option<IntegronType> {
    match s {
        "complete" => Some(IntegronType::Complete),
        "attC0" => Some(IntegronType::AttC0),
        "In0" => Some(IntegronType::In0),
        _ => None,
    }
}

impl Record {
    pub fn to_line(&self) -> String {
        [
            self.integron.clone(),
            self.replicon.clone(),
            self.element.clone(),
            self.pos_beg.to_string(),
            self.pos_end.to_string(),
            self.strand.sign().to_string(),
            self.evalue
                .map(format_evalue)
                .unwrap_or_else(|| "NA".to_string()),
            self.type_elt.clone(),
            self.annotation.clone(),
            self.model.clone(),
            self.kind.to_string(),
            if self.default { "Yes" } else { "No" }.to_string(),
            self.distance
                .map(|d| d.to_string())
                .unwrap_or_else(|| "NA".to_string()),
        ]
        .join("\t")
    }

    pub fn from_line(line: &str, line_no: usize) -> Result<Self, Error> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() != HEADER.len() {
            return Err(Error::malformed(
                line_no,
                format!("{} columns, expected {}", fields.len(), HEADER.len()),
            ));
        }
        let num = |idx: usize| -> Result<u64, Error> {
            fields[idx].parse::<u64>().map_err(|_| {
                Error::malformed(line_no, format!("{} is not a position: {}", HEADER[idx], fields[idx]))
            })
        };

        let strand = Strand::parse(fields[5])
            .ok_or_else(|| Error::malformed(line_no, format!("bad strand {}", fields[5])))?;
        let evalue = match fields[6] {
            "NA" | "" => None,
            s => Some(
                s.parse::<f64>()
                    .map_err(|_| Error::malformed(line_no, format!("bad e-value {}", s)))?,
            ),
        };
        let kind = parse_kind(fields[10])
            .ok_or_else(|| Error::malformed(line_no, format!("unknown integron type {}", fields[10])))?;
        let distance = match fields[12] {
            "NA" | "" => None,
            // written as a float by some versions
            s => Some(s.parse::<f64>().map_err(|_| {
                Error::malformed(line_no, format!("bad distance_2attC {}", s))
            })? as u64),
        };

        Ok(Self {
            integron: fields[0].to_string(),
            replicon: fields[1].to_string(),
            element: fields[2].to_string(),
            pos_beg: num(3)?,
            pos_end: num(4)?,
            strand,
            evalue,
            type_elt: fields[7].to_string(),
            annotation: fields[8].to_string(),
            model: fields[9].to_string(),
            kind,
            default: fields[11] == "Yes",
            distance,
        })
    }
}

fn by_row_order(a: &Record, b: &Record) -> Ordering {
    a.integron
        .cmp(&b.integron)
        .then(a.pos_beg.cmp(&b.pos_beg))
        .then(
            a.evalue
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.evalue.unwrap_or(f64::INFINITY)),
        )
}

/// Flattens integrons into report rows.
///
/// `exhaustive` marks rows produced with the exhaustive search
/// (`default` = `No`).
pub fn describe(integrons: &[Integron], exhaustive: bool) -> Vec<Record> {
    let mut records = vec![];

    let order = integrons
        .iter()
        .enumerate()
        .sorted_by_key(|(i, integron)| (integron.min_position(), *i))
        .map(|(_, integron)| integron);

    for (rank, integron) in order.enumerate() {
        let name = format!("integron_{:02}", rank + 1);
        let row = |element: String,
                   hit: &Hit,
                   type_elt: &str,
                   annotation: &str,
                   distance: Option<u64>| Record {
            integron: name.clone(),
            replicon: integron.replicon().to_string(),
            element,
            pos_beg: hit.start(),
            pos_end: hit.end(),
            strand: hit.strand(),
            evalue: Some(hit.evalue()),
            type_elt: type_elt.to_string(),
            annotation: annotation.to_string(),
            model: hit.model().to_string(),
            kind: integron.integron_type(),
            default: !exhaustive,
            distance,
        };

        if let Some(int) = integron.integrase() {
            let element = int.id().unwrap_or("intI").to_string();
            records.push(row(element, int, "protein", "intI", None));
        }
        for (i, (hit, size)) in integron
            .attc()
            .iter()
            .zip(integron.cassette_sizes())
            .enumerate()
        {
            records.push(row(format!("attc_{:03}", i + 1), hit, "attC", "attC", size));
        }
        for protein in integron.proteins() {
            records.push(Record {
                integron: name.clone(),
                replicon: integron.replicon().to_string(),
                element: protein.id().to_string(),
                pos_beg: protein.start(),
                pos_end: protein.end(),
                strand: protein.strand(),
                evalue: None,
                type_elt: "protein".to_string(),
                annotation: "protein".to_string(),
                model: "NA".to_string(),
                kind: integron.integron_type(),
                default: !exhaustive,
                distance: None,
            });
        }
    }

    records.sort_by(by_row_order);
    records
}

pub fn write_report<W: Write>(writer: &mut W, records: &[Record]) -> std::io::Result<()> {
    if records.is_empty() {
        writer.write_fmt(format_args!("{}\n", NO_INTEGRON))?;
        return Ok(());
    }
    writer.write_fmt(format_args!("{}\n", HEADER.join("\t")))?;
    for record in records {
        writer.write_fmt(format_args!("{}\n", record.to_line()))?;
    }
    Ok(())
}

/// Reads a `.integrons` table; `# No Integron found` gives no rows
pub fn read_report<R: BufRead>(reader: R) -> Result<Vec<Record>, Error> {
    let mut records = vec![];
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with(HEADER[0]) {
            continue;
        }
        records.push(Record::from_line(&line, i + 1)?);
    }
    Ok(records)
}

/// Joins reports replicon by replicon, in the order they are first seen.
///
/// A replicon present in several reports keeps the rows of the last one.
pub fn merge_reports(reports: Vec<Vec<Record>>) -> Vec<Record> {
    let mut by_replicon: IndexMap<String, Vec<Record>> = IndexMap::new();
    for report in reports {
        let mut seen: IndexMap<String, Vec<Record>> = IndexMap::new();
        for record in report {
            seen.entry(record.replicon.clone()).or_default().push(record);
        }
        for (replicon, records) in seen {
            if by_replicon.contains_key(&replicon) {
                warn!("{} found in several reports, the last one is kept", replicon);
            }
            by_replicon.insert(replicon, records);
        }
    }
    by_replicon.into_values().flatten().collect()
}

/// Integron counts of one replicon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub replicon: String,
    pub complete: usize,
    pub in0: usize,
    pub attc0: usize,
}

pub fn summarize(records: &[Record]) -> Vec<Summary> {
    let mut by_replicon: IndexMap<&str, IndexMap<&str, IntegronType>> = IndexMap::new();
    for record in records {
        by_replicon
            .entry(record.replicon.as_str())
            .or_default()
            .insert(record.integron.as_str(), record.kind);
    }

    by_replicon
        .into_iter()
        .map(|(replicon, integrons)| {
            let mut summary = Summary {
                replicon: replicon.to_string(),
                ..Default::default()
            };
            for kind in integrons.values() {
                match kind {
                    IntegronType::Complete => summary.complete += 1,
                    IntegronType::In0 => summary.in0 += 1,
                    IntegronType::AttC0 => summary.attc0 += 1,
                }
            }
            summary
        })
        .collect()
}

pub fn write_summary<W: Write>(writer: &mut W, summaries: &[Summary]) -> std::io::Result<()> {
    writer.write_fmt(format_args!("ID_replicon\tcomplete\tIn0\tattC0\n"))?;
    for s in summaries {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\t{}\n",
            s.replicon, s.complete, s.in0, s.attc0
        ))?;
    }
    Ok(())
}
