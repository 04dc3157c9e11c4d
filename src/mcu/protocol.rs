use crate::error::{Error, Result};
use crate::types::TiltAngle;

//commands are a single ascii digit followed by LINE_END
pub const LINE_END: u8 = b'\n';
pub const ANGLE_PREFIX: &str = "AA";
pub const INIT_ACK: char = 'T';
pub const STEP_DONE: char = 'F';
//longest line kept while waiting for LINE_END
pub const MAX_LINE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum McuCommand{
    Step = b'3',
    QueryAngle = b'4',
    Init = b'5',
}

impl McuCommand{
    pub fn to_bytes(self) -> [u8; 2]{
        [self as u8, LINE_END]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum McuResponse{
    //"AA<degrees>"
    Angle(TiltAngle),
    //line ending in 'T': init confirmed
    Started,
    //line ending in 'F': step finished
    Finished,
    //anything else the firmware prints
    Info(String),
}

impl McuResponse{
    //parse one line with its terminator already stripped
    pub fn parse(line: &str) -> Result<Self>{
        let line = line.trim_end();

        if let Some(value) = line.strip_prefix(ANGLE_PREFIX){
            return parse_angle(value).map(McuResponse::Angle);
        }

        match line.chars().last(){
            Some(INIT_ACK) => Ok(McuResponse::Started),
            Some(STEP_DONE) => Ok(McuResponse::Finished),
            _ => Ok(McuResponse::Info(line.to_string())),
        }
    }
}

fn parse_angle(value: &str) -> Result<TiltAngle>{
    let angle: TiltAngle = value
        .trim()
        .parse()
        .map_err(|_| Error::protocol(format!("invalid angle {:?}", value)))?;

    if !angle.is_finite(){
        return Err(Error::protocol(format!("non-finite angle {:?}", value)));
    }
    Ok(angle)
}

//splits the incoming byte stream into lines
#[derive(Debug, Default)]
pub struct LineReader{
    rx_buffer: Vec<u8>,
}

impl LineReader{
    pub fn new() -> Self{
        LineReader{ rx_buffer: Vec::with_capacity(MAX_LINE_LEN) }
    }

    pub fn feed(&mut self, data: &[u8]){
        self.rx_buffer.extend_from_slice(data);
    }

    pub fn next_line(&mut self) -> Option<String>{
        let Some(end) = self.rx_buffer.iter().position(|&b| b == LINE_END) else{
            if self.rx_buffer.len() > MAX_LINE_LEN{
                //no terminator in sight, drop the garbage
                log::warn!("Discarding {} bytes without line terminator", self.rx_buffer.len());
                self.rx_buffer.clear();
            }
            return None;
        };

        let line: Vec<u8> = self.rx_buffer.drain(..=end).collect();
        let text = String::from_utf8_lossy(&line[..end]);
        Some(text.trim_end_matches('\r').to_string())
    }

    //drops buffered bytes, returns how many were dropped
    pub fn clear(&mut self) -> usize{
        let dropped = self.rx_buffer.len();
        self.rx_buffer.clear();
        dropped
    }
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_command_bytes(){
        assert_eq!(McuCommand::Step.to_bytes(), *b"3\n");
        assert_eq!(McuCommand::QueryAngle.to_bytes(), *b"4\n");
        assert_eq!(McuCommand::Init.to_bytes(), *b"5\n");
    }

    #[test]
    fn test_parse_responses(){
        assert_eq!(McuResponse::parse("AA12.5").unwrap(), McuResponse::Angle(12.5));
        assert_eq!(McuResponse::parse("AA -3").unwrap(), McuResponse::Angle(-3.0));
        assert_eq!(McuResponse::parse("Arduino ready T").unwrap(), McuResponse::Started);
        assert_eq!(McuResponse::parse("STEP F").unwrap(), McuResponse::Finished);
        assert_eq!(
            McuResponse::parse("moving").unwrap(),
            McuResponse::Info("moving".to_string())
        );
    }

    #[test]
    fn test_bad_angle_is_protocol_error(){
        assert!(McuResponse::parse("AAnope").unwrap_err().is_protocol());
        assert!(McuResponse::parse("AA").unwrap_err().is_protocol());
        assert!(McuResponse::parse("AAinf").unwrap_err().is_protocol());
    }

    #[test]
    fn test_line_reader_clear_drops_partial_line(){
        let mut reader = LineReader::new();
        reader.feed(b"AA5.0\nF");
        assert_eq!(reader.clear(), 7);
        reader.feed(b"\nAA6.0\n");
        assert_eq!(reader.next_line().as_deref(), Some(""));
        assert_eq!(reader.next_line().as_deref(), Some("AA6.0"));
        assert_eq!(reader.clear(), 0);
    }

    #[test]
    fn test_line_reader_splits_and_strips(){
        let mut reader = LineReader::new();
        reader.feed(b"AA1");
        assert_eq!(reader.next_line(), None);
        reader.feed(b"2.5\r\nF\r\npart");
        assert_eq!(reader.next_line().as_deref(), Some("AA12.5"));
        assert_eq!(reader.next_line().as_deref(), Some("F"));
        assert_eq!(reader.next_line(), None);
        reader.feed(b"ial\n");
        assert_eq!(reader.next_line().as_deref(), Some("partial"));
    }

    #[test]
    fn test_line_reader_drops_unterminated_garbage(){
        let mut reader = LineReader::new();
        reader.feed(&[b'x'; MAX_LINE_LEN + 1]);
        assert_eq!(reader.next_line(), None);
        reader.feed(b"F\n");
        assert_eq!(reader.next_line().as_deref(), Some("F"));
    }
}
