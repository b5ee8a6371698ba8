//! 流式 `Record` 提取
//!
//! 使用拉取式解析器单遍扫描导出文件。未请求类型的记录在扫描时即被丢弃，
//! 内存占用只与匹配的数据量成正比。

use super::record::{ExtractionResult, HealthRecord, RecordAttributes};
use super::types::HealthDataType;
use crate::error::{HealthError, HealthResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};

const RECORD_ELEMENT: &[u8] = b"Record";

/// 单次扫描的统计计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// 所有开始标签与空标签
    pub elements: u64,
    /// 所有 `Record` 元素
    pub records_seen: u64,
    /// 保留下来的 `Record` 元素
    pub records_matched: u64,
}

impl ExtractStats {
    pub fn records_skipped(&self) -> u64 {
        self.records_seen - self.records_matched
    }
}

/// 从 `path` 处的导出文件中提取请求的记录类型
pub async fn extract(
    path: impl AsRef<Path>,
    requested: &[HealthDataType],
) -> HealthResult<ExtractionResult> {
    extract_with_stats(path, requested)
        .await
        .map(|(result, _)| result)
}

/// 与 [`extract`] 相同，同时返回扫描统计
pub async fn extract_with_stats(
    path: impl AsRef<Path>,
    requested: &[HealthDataType],
) -> HealthResult<(ExtractionResult, ExtractStats)> {
    let path = path.as_ref();
    tracing::info!("Extracting {} record types from {}", requested.len(), path.display());

    let file = File::open(path).await.map_err(|source| HealthError::File {
        path: path.to_path_buf(),
        source,
    })?;

    // 文件句柄由 reader 持有，任何返回路径上都会被释放
    extract_from_reader(BufReader::new(file), path, requested).await
}

/// 扫描任意带缓冲的异步数据源，`origin` 仅用于错误信息
pub async fn extract_from_reader<R>(
    source: R,
    origin: &Path,
    requested: &[HealthDataType],
) -> HealthResult<(ExtractionResult, ExtractStats)>
where
    R: AsyncBufRead + Unpin,
{
    let mut scan = Scan::new(origin, requested);
    let mut reader = Reader::from_reader(source);
    reader.config_mut().check_end_names = true;

    let mut buf = Vec::new();
    loop {
        let event = match reader.read_event_into_async(&mut buf).await {
            Ok(event) => event,
            Err(err) => return Err(scan.read_error(err, reader.buffer_position() as u64)),
        };

        let checked = match event {
            Event::Start(element) => scan.open(&element),
            Event::Empty(element) => scan
                .open(&element)
                .map(|_| scan.close(element.name().as_ref())),
            Event::End(element) => {
                scan.close(element.name().as_ref());
                Ok(())
            }
            Event::Text(text) => scan.text(&text),
            Event::CData(_) => scan.text(b"<![CDATA["),
            Event::Eof => break,
            _ => Ok(()),
        };
        checked.map_err(|message| scan.parse_error(reader.buffer_position() as u64, message))?;
        buf.clear();
    }

    scan.finish(reader.buffer_position() as u64)
}

/// 单次扫描的可变状态
struct Scan {
    origin: PathBuf,
    requested: HashSet<HealthDataType>,
    result: ExtractionResult,
    stats: ExtractStats,
    depth: usize,
    seen_root: bool,
    root_closed: bool,
    /// 等待结束标签的匹配记录及其打开时的深度，按嵌套顺序入栈
    pending: Vec<(usize, HealthRecord)>,
}

impl Scan {
    fn new(origin: &Path, requested: &[HealthDataType]) -> Self {
        let result = requested.iter().map(|ty| (*ty, Vec::new())).collect();
        Self {
            origin: origin.to_path_buf(),
            requested: requested.iter().copied().collect(),
            result,
            stats: ExtractStats::default(),
            depth: 0,
            seen_root: false,
            root_closed: false,
            pending: Vec::new(),
        }
    }

    fn open(&mut self, element: &BytesStart<'_>) -> Result<(), String> {
        if self.root_closed {
            return Err(format!(
                "element <{}> after the root element",
                String::from_utf8_lossy(element.name().as_ref())
            ));
        }
        self.depth += 1;
        self.seen_root = true;
        self.stats.elements += 1;

        // 每个元素的属性都要完整校验，跳过的元素也不例外
        let record_type = check_attributes(element)?;

        if element.name().as_ref() != RECORD_ELEMENT {
            return Ok(());
        }
        self.stats.records_seen += 1;

        if let Some(record_type) = record_type.filter(|ty| self.requested.contains(ty)) {
            let record = HealthRecord::from_attributes(record_type, read_attributes(element)?);
            self.pending.push((self.depth, record));
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        if name == RECORD_ELEMENT
            && self.pending.last().map(|(depth, _)| *depth) == Some(self.depth)
        {
            if let Some((_, record)) = self.pending.pop() {
                self.commit(record);
            }
        }
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 && self.seen_root {
            self.root_closed = true;
        }
    }

    /// 根元素之外只允许空白
    fn text(&self, text: &[u8]) -> Result<(), String> {
        if self.depth == 0 && !text.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(format!(
                "text outside the root element: {:?}",
                String::from_utf8_lossy(&text[..text.len().min(32)])
            ));
        }
        Ok(())
    }

    fn commit(&mut self, record: HealthRecord) {
        self.stats.records_matched += 1;
        if let Some(records) = self.result.get_mut(&record.record_type) {
            records.push(record);
        }
    }

    fn finish(self, position: u64) -> HealthResult<(ExtractionResult, ExtractStats)> {
        if !self.seen_root {
            return Err(self.parse_error(position, "no root element found".to_string()));
        }
        if self.depth != 0 {
            return Err(self.parse_error(
                position,
                format!("unexpected end of document, {} element(s) left open", self.depth),
            ));
        }

        tracing::info!(
            "Scanned {} elements: {} records, {} matched, {} skipped",
            self.stats.elements,
            self.stats.records_seen,
            self.stats.records_matched,
            self.stats.records_skipped()
        );
        for (ty, records) in &self.result {
            tracing::debug!("{}: {} records", ty, records.len());
        }

        Ok((self.result, self.stats))
    }

    fn parse_error(&self, position: u64, message: String) -> HealthError {
        tracing::error!("XML parse error in {} at byte {}: {}", self.origin.display(), position, message);
        HealthError::Parse {
            path: self.origin.clone(),
            position,
            message,
        }
    }

    fn read_error(&self, err: quick_xml::Error, position: u64) -> HealthError {
        match err {
            quick_xml::Error::Io(shared) => HealthError::File {
                path: self.origin.clone(),
                source: Arc::try_unwrap(shared)
                    .unwrap_or_else(|shared| std::io::Error::new(shared.kind(), shared.to_string())),
            },
            other => self.parse_error(position, other.to_string()),
        }
    }
}

/// 校验全部属性（语法、重复、实体引用），并顺带识别 `type`。
/// 未转义的值以借用形式返回，不产生分配。
fn check_attributes(element: &BytesStart<'_>) -> Result<Option<HealthDataType>, String> {
    let mut record_type = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        if attr.key.as_ref() == b"type" {
            record_type = HealthDataType::from_identifier(&value);
        }
    }
    Ok(record_type)
}

fn read_attributes(element: &BytesStart<'_>) -> Result<RecordAttributes, String> {
    let mut attrs = RecordAttributes::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let slot = match attr.key.as_ref() {
            b"startDate" => &mut attrs.start_date,
            b"endDate" => &mut attrs.end_date,
            b"value" => &mut attrs.value,
            b"unit" => &mut attrs.unit,
            b"sourceName" => &mut attrs.source_name,
            _ => continue,
        };
        *slot = Some(attr.unescape_value().map_err(|e| e.to_string())?.into_owned());
    }
    Ok(attrs)
}
