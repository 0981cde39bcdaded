use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::positions::RawField;

pub const COL_PLAYER: &str = "Joueur";
pub const COL_SESSION: &str = "Session Title";
pub const COL_DURATION: &str = "Durée";
pub const COL_X: &str = "X";
pub const COL_Y: &str = "Y";
pub const COL_TOUCHES: &str = "Ballons touchés";
pub const COL_POSITION: &str = "Poste";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sheet {
    Tracking,
    Video,
    Positions,
    Constants,
}

impl Sheet {
    pub const ALL: [Sheet; 4] = [Sheet::Tracking, Sheet::Video, Sheet::Positions, Sheet::Constants];

    pub fn name(self) -> &'static str {
        match self {
            Sheet::Tracking => "CSV",
            Sheet::Video => "Vidéo",
            Sheet::Positions => "Poste",
            Sheet::Constants => "Constante",
        }
    }

    fn file_names(self) -> &'static [&'static str] {
        match self {
            Sheet::Tracking => &["CSV.csv"],
            Sheet::Video => &["Vidéo.csv", "Video.csv"],
            Sheet::Positions => &["Poste.csv"],
            Sheet::Constants => &["Constante.csv"],
        }
    }

    fn locate(self, dir: &Path) -> Option<PathBuf> {
        self.file_names()
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// Playing position codes used by the reference constant sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Position {
    AT,
    AIL,
    MIL,
    DC,
    DL,
    GB,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::AT,
        Position::AIL,
        Position::MIL,
        Position::DC,
        Position::DL,
        Position::GB,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Position::AT => "AT",
            Position::AIL => "AIL",
            Position::MIL => "MIL",
            Position::DC => "DC",
            Position::DL => "DL",
            Position::GB => "GB",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::AT => "Attaquant",
            Position::AIL => "Ailier",
            Position::MIL => "Milieu",
            Position::DC => "Défenseur central",
            Position::DL => "Défenseur latéral",
            Position::GB => "Gardien",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        let key = raw.trim();
        Position::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingRow {
    pub player: String,
    pub session: String,
    pub duration_s: Option<f64>,
    /// Numeric cells by header; blank or non-numeric cells are absent.
    pub columns: BTreeMap<String, f64>,
}

impl TrackingRow {
    pub fn value(&self, column: &str) -> Option<f64> {
        self.columns.get(column).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRow {
    pub player: String,
    pub session: String,
    pub x: RawField,
    pub y: RawField,
    pub touches: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantTable {
    values: HashMap<String, HashMap<Position, f64>>,
    order: Vec<String>,
}

impl ConstantTable {
    pub fn insert(&mut self, indicator: &str, position: Position, value: f64) {
        let key = indicator.trim().to_string();
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.entry(key).or_default().insert(position, value);
    }

    pub fn reference(&self, indicator: &str, position: Position) -> Option<f64> {
        self.values
            .get(indicator.trim())
            .and_then(|row| row.get(&position))
            .copied()
    }

    pub fn indicators(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub type PositionTable = HashMap<String, Position>;

/// Every sheet of one uploaded workbook, validated once.
#[derive(Debug, Clone, Default)]
pub struct SessionBundle {
    pub source: Option<PathBuf>,
    pub tracking: Vec<TrackingRow>,
    pub video: Vec<VideoRow>,
    pub positions: PositionTable,
    pub constants: ConstantTable,
}

impl SessionBundle {
    /// Players from the tracking sheet, in first-seen order.
    pub fn players(&self) -> Vec<String> {
        unique_in_order(self.tracking.iter().map(|r| r.player.as_str()))
    }

    pub fn video_players(&self) -> Vec<String> {
        unique_in_order(self.video.iter().map(|r| r.player.as_str()))
    }

    pub fn video_sessions(&self) -> Vec<String> {
        unique_in_order(self.video.iter().map(|r| r.session.as_str()))
    }

    /// Tracking sessions of one player, in sheet order.
    pub fn sessions_for(&self, player: &str) -> Vec<String> {
        unique_in_order(
            self.tracking
                .iter()
                .filter(|r| r.player == player)
                .map(|r| r.session.as_str()),
        )
    }

    pub fn tracking_for(&self, player: &str) -> Vec<&TrackingRow> {
        self.tracking.iter().filter(|r| r.player == player).collect()
    }

    pub fn video_rows_for(&self, player: &str) -> Vec<&VideoRow> {
        self.video.iter().filter(|r| r.player == player).collect()
    }

    pub fn video_for(&self, player: &str, session: &str) -> Option<&VideoRow> {
        self.video
            .iter()
            .find(|r| r.player == player && r.session == session)
    }

    pub fn position_of(&self, player: &str) -> Option<Position> {
        self.positions.get(player.trim()).copied()
    }
}

fn unique_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !item.is_empty() && !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}

pub fn load_bundle(dir: &Path) -> Result<SessionBundle, IngestError> {
    let mut located = HashMap::new();
    let mut missing = Vec::new();
    for sheet in Sheet::ALL {
        match sheet.locate(dir) {
            Some(path) => {
                located.insert(sheet.name(), path);
            }
            None => missing.push(sheet.name().to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(IngestError::MissingSheets { missing });
    }

    let tracking_path = &located[Sheet::Tracking.name()];
    let video_path = &located[Sheet::Video.name()];
    let positions_path = &located[Sheet::Positions.name()];
    let constants_path = &located[Sheet::Constants.name()];

    let bundle = SessionBundle {
        source: Some(dir.to_path_buf()),
        tracking: parse_tracking(&read_sheet(tracking_path, Sheet::Tracking)?)?,
        video: parse_video(&read_sheet(video_path, Sheet::Video)?)?,
        positions: parse_positions(&read_sheet(positions_path, Sheet::Positions)?)?,
        constants: parse_constants(&read_sheet(constants_path, Sheet::Constants)?),
    };
    log::info!(
        "loaded bundle {}: {} tracking rows, {} video rows, {} players with positions, {} indicators",
        dir.display(),
        bundle.tracking.len(),
        bundle.video.len(),
        bundle.positions.len(),
        bundle.constants.len()
    );
    Ok(bundle)
}

/// Header row plus records of one sheet, with cells trimmed.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub sheet: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, IngestError> {
        self.column(name).ok_or_else(|| IngestError::MissingColumn {
            sheet: self.sheet.to_string(),
            column: name.to_string(),
        })
    }
}

pub fn read_sheet(path: &Path, sheet: Sheet) -> Result<SheetTable, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_sheet_from(file, sheet).map_err(|source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_sheet_from<R: std::io::Read>(reader: R, sheet: Sheet) -> Result<SheetTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(SheetTable {
        sheet: sheet.name(),
        headers,
        rows,
    })
}

/// Parses a numeric cell, accepting a decimal comma when no dot is present.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    let parsed = if cell.contains(',') && !cell.contains('.') {
        cell.replace(',', ".").parse::<f64>()
    } else {
        cell.parse::<f64>()
    };
    parsed.ok().filter(|v| v.is_finite())
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

pub fn parse_tracking(table: &SheetTable) -> Result<Vec<TrackingRow>, IngestError> {
    let player_idx = table.require(COL_PLAYER)?;
    let session_idx = table.require(COL_SESSION)?;
    let duration_idx = table.column(COL_DURATION);

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let player = cell(row, player_idx).to_string();
        if player.is_empty() {
            log::debug!("tracking sheet: skipping row without player");
            continue;
        }
        let mut columns = BTreeMap::new();
        for (idx, header) in table.headers.iter().enumerate() {
            if idx == player_idx || idx == session_idx || header.is_empty() {
                continue;
            }
            if let Some(value) = parse_number(cell(row, idx)) {
                columns.insert(header.clone(), value);
            }
        }
        out.push(TrackingRow {
            player,
            session: cell(row, session_idx).to_string(),
            duration_s: duration_idx.and_then(|idx| parse_number(cell(row, idx))),
            columns,
        });
    }
    Ok(out)
}

pub fn parse_video(table: &SheetTable) -> Result<Vec<VideoRow>, IngestError> {
    let player_idx = table.require(COL_PLAYER)?;
    let session_idx = table.require(COL_SESSION)?;
    let x_idx = table.column(COL_X);
    let y_idx = table.column(COL_Y);
    let touches_idx = table.column(COL_TOUCHES);

    let field = |row: &[String], idx: Option<usize>| {
        idx.map(|i| RawField::from_cell(cell(row, i)))
            .unwrap_or(RawField::Empty)
    };

    Ok(table
        .rows
        .iter()
        .filter(|row| !cell(row, player_idx).is_empty())
        .map(|row| VideoRow {
            player: cell(row, player_idx).to_string(),
            session: cell(row, session_idx).to_string(),
            x: field(row, x_idx),
            y: field(row, y_idx),
            touches: touches_idx.and_then(|i| parse_number(cell(row, i))),
        })
        .collect())
}

pub fn parse_positions(table: &SheetTable) -> Result<PositionTable, IngestError> {
    let player_idx = table.require(COL_PLAYER)?;
    let position_idx = table.require(COL_POSITION)?;
    let mut out = HashMap::new();
    for row in &table.rows {
        let player = cell(row, player_idx);
        match Position::from_code(cell(row, position_idx)) {
            Some(position) if !player.is_empty() => {
                // First row wins, like a lookup on the first match.
                out.entry(player.to_string()).or_insert(position);
            }
            _ => log::warn!(
                "positions sheet: ignoring row {player:?} / {:?}",
                cell(row, position_idx)
            ),
        }
    }
    Ok(out)
}

/// First column names the indicator; remaining headers are position codes.
pub fn parse_constants(table: &SheetTable) -> ConstantTable {
    let position_columns: Vec<(usize, Position)> = table
        .headers
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, h)| Position::from_code(h).map(|p| (idx, p)))
        .collect();

    let mut constants = ConstantTable::default();
    for row in &table.rows {
        let indicator = cell(row, 0);
        if indicator.is_empty() {
            continue;
        }
        for (idx, position) in &position_columns {
            if let Some(value) = parse_number(cell(row, *idx)) {
                constants.insert(indicator, *position, value);
            }
        }
    }
    constants
}
