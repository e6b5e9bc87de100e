//! TCP 게임 프로토콜 코덱
//!
//! 클라이언트와 서버 간 바이너리 패킷을 인코딩/디코딩합니다.
//!
//! # 프레임 구조
//!
//! ```text
//! [4바이트 길이 (BE)][2바이트 opcode (BE)][본문]
//! ```
//!
//! 길이 헤더는 opcode와 본문을 합친 크기입니다. 본문 필드는 작성된 순서와
//! 타입 그대로 읽어야 합니다.
//!
//! - **text**: 2바이트 길이(BE) + UTF-8 바이트
//! - **int**: 4바이트 부호 있는 정수(BE)
//! - **short**: 2바이트 부호 있는 정수(BE)
//! - **bool**: 1바이트, 0이 아니면 true
//!
//! # 사용 예시
//!
//! ```rust
//! use tcpserver::protocol::{IncomingPacket, OutgoingPacket};
//!
//! let wire = OutgoingPacket::new(2257).append_text("WINTER2024").append_int(5).encode();
//! let mut packet = IncomingPacket::decode(&wire).unwrap();
//! assert_eq!(packet.read_text().unwrap(), "WINTER2024");
//! assert_eq!(packet.read_int().unwrap(), 5);
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

pub mod opcode;

/// 길이 헤더 크기
pub const FRAME_LENGTH_SIZE: usize = 4;
/// opcode 헤더 크기
pub const OPCODE_SIZE: usize = 2;
/// 기본 최대 프레임 크기 (64KB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// 잘못된 패킷 에러
///
/// 디코딩 단계의 에러로, 해당 패킷만 거부되고 연결은 유지됩니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("패킷 길이 부족: {field} 읽기에 {needed}바이트 필요, 남은 바이트 {remaining}")]
    Underrun {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("문자열 UTF-8 디코딩 실패 (오프셋 {offset})")]
    InvalidUtf8 { offset: usize },

    #[error("opcode 헤더 부족: 프레임 {len}바이트")]
    MissingOpcode { len: usize },

    #[error("선언된 길이 {declared}바이트가 버퍼 {available}바이트를 초과")]
    LengthMismatch { declared: usize, available: usize },
}

/// 프레임 수준 전송 에러
///
/// 길이 헤더를 신뢰할 수 없거나 스트림이 끊긴 경우로, 연결을 종료합니다.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("프레임 크기 초과: {declared}바이트 (최대 {max}바이트)")]
    Oversized { declared: usize, max: usize },

    #[error("스트림 I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 수신 패킷
///
/// 하나의 디스패치 호출에만 속하며, 읽기 커서는 필드를 읽을 때마다 전진합니다.
#[derive(Debug, Clone)]
pub struct IncomingPacket {
    opcode: u16,
    body: Bytes,
    cursor: usize,
}

impl IncomingPacket {
    pub fn new(opcode: u16, body: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            body: body.into(),
            cursor: 0,
        }
    }

    /// 길이 헤더가 제거된 프레임(opcode + 본문)에서 패킷 생성
    pub fn from_frame(frame: Bytes) -> Result<Self, PacketError> {
        if frame.len() < OPCODE_SIZE {
            return Err(PacketError::MissingOpcode { len: frame.len() });
        }

        let opcode = u16::from_be_bytes([frame[0], frame[1]]);
        Ok(Self::new(opcode, frame.slice(OPCODE_SIZE..)))
    }

    /// 길이 헤더를 포함한 버퍼 디코딩
    ///
    /// 선언된 길이 뒤에 남는 바이트는 다음 프레임의 것으로 보고 무시합니다.
    pub fn decode(buffer: &[u8]) -> Result<Self, PacketError> {
        if buffer.len() < FRAME_LENGTH_SIZE {
            return Err(PacketError::Underrun {
                field: "frame_length",
                needed: FRAME_LENGTH_SIZE,
                remaining: buffer.len(),
            });
        }

        let declared =
            u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
        let available = buffer.len() - FRAME_LENGTH_SIZE;
        if declared > available {
            return Err(PacketError::LengthMismatch {
                declared,
                available,
            });
        }

        let frame = Bytes::copy_from_slice(
            &buffer[FRAME_LENGTH_SIZE..FRAME_LENGTH_SIZE + declared],
        );
        Self::from_frame(frame)
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// 아직 읽지 않은 바이트 수
    pub fn remaining(&self) -> usize {
        self.body.len() - self.cursor
    }

    /// 길이 접두 문자열 읽기
    ///
    /// 길이 또는 내용이 부족하면 커서를 움직이지 않고 실패합니다.
    pub fn read_text(&mut self) -> Result<String, PacketError> {
        let len = u16::from_be_bytes(self.peek::<2>("text_length")?) as usize;

        let remaining = self.remaining() - 2;
        if len > remaining {
            return Err(PacketError::Underrun {
                field: "text",
                needed: len,
                remaining,
            });
        }

        let start = self.cursor + 2;
        let text = std::str::from_utf8(&self.body[start..start + len])
            .map_err(|_| PacketError::InvalidUtf8 { offset: start })?
            .to_string();

        self.cursor = start + len;
        Ok(text)
    }

    /// 4바이트 정수 읽기
    pub fn read_int(&mut self) -> Result<i32, PacketError> {
        let bytes = self.take::<4>("int")?;
        Ok(i32::from_be_bytes(bytes))
    }

    /// 2바이트 정수 읽기
    pub fn read_short(&mut self) -> Result<i16, PacketError> {
        let bytes = self.take::<2>("short")?;
        Ok(i16::from_be_bytes(bytes))
    }

    pub fn read_bool(&mut self) -> Result<bool, PacketError> {
        let [b] = self.take::<1>("bool")?;
        Ok(b != 0)
    }

    fn peek<const N: usize>(&self, field: &'static str) -> Result<[u8; N], PacketError> {
        let remaining = self.remaining();
        if remaining < N {
            return Err(PacketError::Underrun {
                field,
                needed: N,
                remaining,
            });
        }

        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.body[self.cursor..self.cursor + N]);
        Ok(buf)
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], PacketError> {
        let buf = self.peek::<N>(field)?;
        self.cursor += N;
        Ok(buf)
    }
}

/// 송신 패킷 빌더
///
/// 서버 응답에 쓰이며, 테스트 클라이언트도 같은 인코딩으로 요청을 만듭니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPacket {
    opcode: u16,
    body: BytesMut,
}

impl OutgoingPacket {
    pub fn new(opcode: u16) -> Self {
        Self {
            opcode,
            body: BytesMut::with_capacity(64),
        }
    }

    /// 요청 거부 응답
    pub fn generic_error(code: u16, message: &str) -> Self {
        Self::new(opcode::outgoing::GENERIC_ERROR)
            .append_int(i32::from(code))
            .append_text(message)
    }

    pub fn append_int(mut self, value: i32) -> Self {
        self.body.put_i32(value);
        self
    }

    pub fn append_short(mut self, value: i16) -> Self {
        self.body.put_i16(value);
        self
    }

    pub fn append_bool(mut self, value: bool) -> Self {
        self.body.put_u8(u8::from(value));
        self
    }

    /// 문자열 추가
    ///
    /// 길이 접두가 2바이트이므로 65535바이트를 넘는 문자열은 문자 경계에서 잘립니다.
    pub fn append_text(mut self, value: &str) -> Self {
        let mut end = value.len().min(u16::MAX as usize);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        if end < value.len() {
            warn!(
                "문자열이 너무 김: {}바이트 -> {}바이트로 자름 (opcode {})",
                value.len(),
                end,
                self.opcode
            );
        }

        self.body.put_u16(end as u16);
        self.body.put_slice(&value.as_bytes()[..end]);
        self
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 길이 헤더를 포함한 와이어 바이트
    pub fn encode(&self) -> Bytes {
        let frame_len = OPCODE_SIZE + self.body.len();
        let mut buf = BytesMut::with_capacity(FRAME_LENGTH_SIZE + frame_len);
        buf.put_u32(frame_len as u32);
        buf.put_u16(self.opcode);
        buf.put_slice(&self.body);
        buf.freeze()
    }

    /// 같은 바이트를 수신 측에서 읽기 위한 변환
    pub fn to_incoming(&self) -> IncomingPacket {
        IncomingPacket::new(self.opcode, self.body.clone().freeze())
    }
}

/// 스트림에서 프레임 하나 읽기
///
/// 반환값은 길이 헤더를 뺀 opcode + 본문입니다. 프레임 경계에서 스트림이
/// 닫히면 `Ok(None)`을 반환합니다.
pub async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> Result<Option<Bytes>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; FRAME_LENGTH_SIZE];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let declared = u32::from_be_bytes(len_buf) as usize;
    if declared > max_frame_size {
        return Err(FrameError::Oversized {
            declared,
            max: max_frame_size,
        });
    }

    let mut data = BytesMut::zeroed(declared);
    reader.read_exact(&mut data).await?;
    Ok(Some(data.freeze()))
}

/// 스트림에 패킷 하나 쓰기 (flush는 호출자 몫)
pub async fn write_frame<W>(writer: &mut W, packet: &OutgoingPacket) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&packet.encode()).await
}
