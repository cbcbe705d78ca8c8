use crate::error::FrameError;

/// Largest accepted bulk string, matching Redis' `proto-max-bulk-len`.
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
pub const MAX_ARRAY_LEN: i64 = 1024 * 1024;
pub const MAX_LINE_LEN: usize = 64 * 1024;
pub const MAX_DEPTH: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    Array(Vec<Frame>),
    NullBulkString,
}

impl Frame {
    pub fn ok() -> Self {
        Frame::SimpleString("OK".to_string())
    }

    pub fn bulk(s: impl Into<String>) -> Self {
        Frame::BulkString(s.into())
    }

    /// Simple strings and errors cannot carry CR or LF; those are written as spaces.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::SimpleString(s) => format!("+{}\r\n", single_line(s)).into_bytes(),
            Frame::Error(s) => format!("-{}\r\n", single_line(s)).into_bytes(),
            Frame::Integer(n) => format!(":{}\r\n", n).into_bytes(),
            Frame::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s).into_bytes(),
            Frame::NullBulkString => b"$-1\r\n".to_vec(),
            Frame::Array(frames) => {
                let mut out = format!("*{}\r\n", frames.len()).into_bytes();
                for frame in frames {
                    out.extend(frame.serialize());
                }
                out
            }
        }
    }

    /// Decodes one frame from the front of `buffer`.
    ///
    /// Returns the frame and the number of bytes it occupied, or `None` if
    /// `buffer` does not hold a complete frame yet. Lengths, line sizes and
    /// nesting are bounded so a partial frame never needs unbounded memory.
    pub fn parse(buffer: &[u8]) -> Result<Option<(Frame, usize)>, FrameError> {
        parse_frame(buffer, 0)
    }
}

fn parse_frame(buffer: &[u8], depth: usize) -> Result<Option<(Frame, usize)>, FrameError> {
    let Some(&kind) = buffer.first() else {
        return Ok(None);
    };

    match kind {
        b'+' => Ok(read_line(buffer)?.map(|(line, len)| {
            (Frame::SimpleString(String::from_utf8_lossy(line).into_owned()), len)
        })),
        b'-' => Ok(read_line(buffer)?
            .map(|(line, len)| (Frame::Error(String::from_utf8_lossy(line).into_owned()), len))),
        b':' => match read_line(buffer)? {
            Some((line, len)) => Ok(Some((Frame::Integer(parse_int(line)?), len))),
            None => Ok(None),
        },
        b'$' => parse_bulk_string(buffer),
        b'*' => parse_array(buffer, depth),
        other => Err(FrameError::UnknownType(other as char)),
    }
}

fn parse_bulk_string(buffer: &[u8]) -> Result<Option<(Frame, usize)>, FrameError> {
    let Some((line, header_len)) = read_line(buffer)? else {
        return Ok(None);
    };

    let bulk_len = parse_int(line)?;
    if bulk_len == -1 {
        return Ok(Some((Frame::NullBulkString, header_len)));
    }
    if !(0..=MAX_BULK_LEN).contains(&bulk_len) {
        return Err(FrameError::InvalidLength(bulk_len));
    }

    let end_of_bulk = header_len + bulk_len as usize;
    let total = end_of_bulk + 2;
    if buffer.len() < total {
        return Ok(None);
    }
    if &buffer[end_of_bulk..total] != b"\r\n" {
        return Err(FrameError::MissingTerminator);
    }

    let s = String::from_utf8(buffer[header_len..end_of_bulk].to_vec())?;
    Ok(Some((Frame::BulkString(s), total)))
}

fn parse_array(buffer: &[u8], depth: usize) -> Result<Option<(Frame, usize)>, FrameError> {
    if depth >= MAX_DEPTH {
        return Err(FrameError::TooDeep(MAX_DEPTH));
    }

    let Some((line, mut consumed)) = read_line(buffer)? else {
        return Ok(None);
    };

    let array_len = parse_int(line)?;
    if !(0..=MAX_ARRAY_LEN).contains(&array_len) {
        return Err(FrameError::InvalidLength(array_len));
    }

    // every element takes at least three bytes, so the buffer bounds the count
    let mut items = Vec::with_capacity((array_len as usize).min(buffer.len() / 3));
    for _ in 0..array_len {
        let Some((item, len)) = parse_frame(&buffer[consumed..], depth + 1)? else {
            return Ok(None);
        };
        items.push(item);
        consumed += len;
    }

    Ok(Some((Frame::Array(items), consumed)))
}

/// Returns the line after the type byte and the length including the CRLF.
fn read_line(buffer: &[u8]) -> Result<Option<(&[u8], usize)>, FrameError> {
    let window = buffer.len().min(MAX_LINE_LEN + 3);
    let found = (2..window)
        .find(|&i| buffer[i - 1] == b'\r' && buffer[i] == b'\n')
        .map(|i| (&buffer[1..i - 1], i + 1));

    if found.is_none() && buffer.len() > MAX_LINE_LEN + 2 {
        return Err(FrameError::LineTooLong(MAX_LINE_LEN));
    }

    Ok(found)
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

fn parse_int(line: &[u8]) -> Result<i64, FrameError> {
    let s = String::from_utf8_lossy(line);
    s.parse::<i64>()
        .map_err(|_| FrameError::InvalidInteger(s.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_array() {
        let input = b"*2\r\n$3\r\nGET\r\n$7\r\nuser:42\r\n";

        let (frame, len) = Frame::parse(input).unwrap().unwrap();

        assert_eq!(len, input.len());
        assert_eq!(
            frame,
            Frame::Array(vec![Frame::bulk("GET"), Frame::bulk("user:42")])
        );
    }

    #[test]
    fn incomplete_input_needs_more_bytes() {
        assert!(Frame::parse(b"").unwrap().is_none());
        assert!(Frame::parse(b"*2\r\n$3\r\nGET\r\n").unwrap().is_none());
        assert!(Frame::parse(b"$5\r\nhel").unwrap().is_none());
        assert!(Frame::parse(b"+OK").unwrap().is_none());
    }

    #[test]
    fn reports_consumed_length_with_trailing_data() {
        let input = b"+PONG\r\n:1\r\n";

        let (frame, len) = Frame::parse(input).unwrap().unwrap();

        assert_eq!(frame, Frame::SimpleString("PONG".to_string()));
        assert_eq!(len, 7);
        assert_eq!(
            Frame::parse(&input[len..]).unwrap().unwrap().0,
            Frame::Integer(1)
        );
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(matches!(
            Frame::parse(b"?what\r\n"),
            Err(FrameError::UnknownType('?'))
        ));
    }

    #[test]
    fn rejects_bad_length() {
        assert!(matches!(
            Frame::parse(b"$abc\r\n"),
            Err(FrameError::InvalidInteger(_))
        ));
    }

    #[test]
    fn null_bulk_string_round_trips() {
        let bytes = Frame::NullBulkString.serialize();

        assert_eq!(bytes, b"$-1\r\n");
        assert_eq!(
            Frame::parse(&bytes).unwrap(),
            Some((Frame::NullBulkString, 5))
        );
    }

    #[test]
    fn rejects_oversized_array_headers_without_allocating() {
        assert!(matches!(
            Frame::parse(b"*9223372036854775807\r\n"),
            Err(FrameError::InvalidLength(_))
        ));
        assert!(matches!(
            Frame::parse(b"*100000000000000\r\n"),
            Err(FrameError::InvalidLength(_))
        ));
        assert!(matches!(
            Frame::parse(b"*-3\r\n"),
            Err(FrameError::InvalidLength(-3))
        ));
    }

    #[test]
    fn large_but_allowed_array_header_is_just_incomplete() {
        assert!(Frame::parse(b"*1048576\r\n$1\r\na\r\n").unwrap().is_none());
    }

    #[test]
    fn rejects_oversized_bulk_length() {
        let header = format!("${}\r\n", MAX_BULK_LEN + 1);

        assert!(matches!(
            Frame::parse(header.as_bytes()),
            Err(FrameError::InvalidLength(len)) if len == MAX_BULK_LEN + 1
        ));
        assert!(Frame::parse(format!("${}\r\n", MAX_BULK_LEN).as_bytes())
            .unwrap()
            .is_none());
    }

    #[test]
    fn rejects_deep_nesting() {
        let nested = b"*1\r\n".repeat(MAX_DEPTH + 1);

        assert!(matches!(
            Frame::parse(&nested),
            Err(FrameError::TooDeep(MAX_DEPTH))
        ));

        let mut allowed = b"*1\r\n".repeat(MAX_DEPTH - 1);
        allowed.extend_from_slice(b":1\r\n");
        assert!(Frame::parse(&allowed).unwrap().is_some());
    }

    #[test]
    fn rejects_unterminated_line_past_limit() {
        let mut line = vec![b'+'];
        line.resize(MAX_LINE_LEN + 10, b'a');

        assert!(matches!(
            Frame::parse(&line),
            Err(FrameError::LineTooLong(MAX_LINE_LEN))
        ));
    }

    #[test]
    fn simple_and_error_payloads_stay_on_one_line() {
        let reply = Frame::Error("ERR unknown command 'X\r\n+OK'".to_string()).serialize();

        let (frame, len) = Frame::parse(&reply).unwrap().unwrap();
        assert_eq!(len, reply.len());
        assert_eq!(frame, Frame::Error("ERR unknown command 'X  +OK'".to_string()));

        assert_eq!(Frame::SimpleString("a\nb".to_string()).serialize(), b"+a b\r\n");
    }

    #[test]
    fn bulk_length_counts_bytes() {
        assert_eq!(Frame::bulk("é").serialize(), "$2\r\né\r\n".as_bytes());
    }
}
