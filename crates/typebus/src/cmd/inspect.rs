use std::cell::RefCell;
use std::fs::File;
use std::rc::Rc;

use typebus_frame::{
    BufferRegistry, ByteSource, DecodeState, FrameDecoder, FrameError, IoSource, PayloadSlot,
};

use crate::cmd::{parse_type_id, InspectArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frames, FrameRecord, OutputFormat};

type FrameLog = Rc<RefCell<Vec<FrameRecord>>>;

/// Registry slot that copies each completed payload into a shared log.
struct CaptureSlot {
    type_id: u32,
    padding: usize,
    buf: RefCell<Box<[u8]>>,
    log: FrameLog,
}

impl CaptureSlot {
    fn new(type_id: u32, size: usize, padding: usize, log: FrameLog) -> Rc<Self> {
        Rc::new(Self {
            type_id,
            padding,
            buf: RefCell::new(vec![0u8; size].into_boxed_slice()),
            log,
        })
    }
}

impl PayloadSlot for CaptureSlot {
    fn type_id(&self) -> u32 {
        self.type_id
    }

    fn payload_bytes(&self) -> usize {
        self.buf.borrow().len()
    }

    fn padding_bytes(&self) -> usize {
        self.padding
    }

    fn fill(&self, offset: usize, bytes: &[u8]) {
        self.buf.borrow_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn complete(&self) {
        let mut log = self.log.borrow_mut();
        let index = log.len();
        log.push(FrameRecord::new(index, self.type_id, &self.buf.borrow()));
    }
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    if args.types.is_empty() {
        return Err(CliError::new(
            USAGE,
            "at least one --type TYPE:SIZE registration is required",
        ));
    }

    let log: FrameLog = Rc::new(RefCell::new(Vec::new()));
    let mut registry = BufferRegistry::new();
    for spec in &args.types {
        let (type_id, size, padding) = parse_type_spec(spec)?;
        registry
            .set(CaptureSlot::new(type_id, size, padding, Rc::clone(&log)))
            .map_err(|err| frame_error("register type", err))?;
    }

    let file = File::open(&args.input).map_err(|err| io_error("open capture file", err))?;
    let mut source = IoSource::new(file);
    let mut decoder = FrameDecoder::with_config(args.wire.to_config(), registry);
    let mut gaps = 0usize;

    'decode: loop {
        if let Some(limit) = args.count {
            if log.borrow().len() >= limit {
                break;
            }
        }
        match decoder.drive(&mut source) {
            Ok(true) => continue,
            Ok(false) => break,
            Err(FrameError::Io(err)) => return Err(io_error("read capture file", err)),
            Err(err) if args.resync => {
                tracing::warn!(error = %err, "decode error, scanning for next frame");
                gaps += 1;
                loop {
                    match decoder.resync(&mut source) {
                        Ok(true) => continue 'decode,
                        Ok(false) => break 'decode,
                        Err(err) => return Err(frame_error("resync", err)),
                    }
                }
            }
            Err(err) => return Err(frame_error("decode capture file", err)),
        }
    }

    if source.is_eof() && decoder.state() != DecodeState::Prefix {
        tracing::warn!(state = ?decoder.state(), "capture ends mid-frame");
    }

    let records = log.borrow();
    print_frames(&records, format);
    if gaps > 0 {
        tracing::warn!(gaps, frames = records.len(), "recovered from decode errors");
    }

    Ok(SUCCESS)
}

/// Parses `TYPE:SIZE[:PAD]` where TYPE is an id (decimal or hex) or a name
/// to hash, and PAD is the trailing padding per frame (default 0).
fn parse_type_spec(spec: &str) -> CliResult<(u32, usize, usize)> {
    let Some((head, last)) = spec.rsplit_once(':') else {
        return Err(CliError::new(
            USAGE,
            format!("expected TYPE:SIZE[:PAD], got '{spec}'"),
        ));
    };
    // Two trailing numeric fields mean SIZE:PAD; one means SIZE alone.
    if let Some((type_part, size_part)) = head.rsplit_once(':') {
        if let (Ok(size), Ok(padding)) = (size_part.parse::<usize>(), last.parse::<usize>()) {
            return Ok((parse_type_id(type_part)?, size, padding));
        }
    }
    let size: usize = last
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid payload size: {last}")))?;
    Ok((parse_type_id(head)?, size, 0))
}
