use thiserror::Error;

/// Fatal conversion errors; anything else degrades to empty values
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Không tìm thấy dòng tiêu đề 'STT' trong file BKHD.")]
    MissingHeader,

    #[error("BKHD thiếu cột bắt buộc: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("không đọc được workbook: {0}")]
    Workbook(String),

    #[error("không ghi được workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("tác vụ chuyển đổi bị gián đoạn: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
