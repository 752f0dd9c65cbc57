use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use trackpace::{RawSample, TrackError};

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Elevation,
    Time,
}

fn sample_from_attributes(e: &BytesStart) -> RawSample {
    let mut sample = RawSample::default();

    for attr in e.attributes().flatten() {
        let Ok(value) = std::str::from_utf8(&attr.value) else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"lat" => sample.lat = Some(value.to_string()),
            b"lon" => sample.lon = Some(value.to_string()),
            _ => {}
        }
    }

    sample
}

/// Collects every `<trkpt>` of the document, across all tracks and segments,
/// in document order.
pub fn extract_raw_samples(input: &[u8]) -> Result<Vec<RawSample>, TrackError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut samples = Vec::new();

    let mut current: Option<RawSample> = None;
    let mut field: Option<Field> = None;
    let mut field_text = String::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(TrackError::MalformedInput {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                });
            }
            Ok(Event::Eof) => break,
            Ok(event) => event.into_owned(),
        };

        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"trkpt" => current = Some(sample_from_attributes(e)),
                b"ele" if current.is_some() => {
                    field = Some(Field::Elevation);
                    field_text.clear();
                }
                b"time" if current.is_some() => {
                    field = Some(Field::Time);
                    field_text.clear();
                }
                _ => {}
            },

            Event::Empty(ref e) => {
                if e.local_name().as_ref() == b"trkpt" {
                    samples.push(sample_from_attributes(e));
                }
            }

            Event::End(ref e) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some(sample) = current.take() {
                        samples.push(sample);
                    }
                    field = None;
                }
                b"ele" | b"time" => {
                    if let (Some(sample), Some(done)) = (current.as_mut(), field.take()) {
                        let text = field_text.trim().to_string();
                        match done {
                            Field::Elevation => sample.elevation = Some(text),
                            Field::Time => sample.time = Some(text),
                        }
                    }
                }
                _ => {}
            },

            Event::Text(ref e) => {
                if field.is_some()
                    && let Ok(text) = std::str::from_utf8(e)
                {
                    field_text.push_str(text);
                }
            }

            Event::CData(ref e) => {
                if field.is_some()
                    && let Ok(text) = std::str::from_utf8(e)
                {
                    field_text.push_str(text);
                }
            }

            Event::GeneralRef(ref e) => {
                if field.is_some() {
                    if let Ok(Some(ch)) = e.resolve_char_ref() {
                        field_text.push(ch);
                    } else if let Ok(name) = e.decode()
                        && let Some(value) = resolve_predefined_entity(&name)
                    {
                        field_text.push_str(value);
                    }
                }
            }

            _ => {}
        }

        buf.clear();
    }

    Ok(samples)
}
