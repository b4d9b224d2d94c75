use approx::assert_relative_eq;
use sirisort_core::{Event, FixedBlock};
use sirisort_format::word::encode_header;
use sirisort_format::DataWord;
use sirisort_io::{sort_file, CancelToken, Error, FetchStrategy, SortConfig};
use std::io::Write;
use tempfile::NamedTempFile;

const BLOCK_WORDS: usize = 8;

fn e_word(channel: u8, adc: u16) -> u32 {
    DataWord::new(0x10, channel, adc).raw()
}

fn write_blocks(blocks: &[Vec<u32>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for words in blocks {
        let mut padded = words.clone();
        padded.resize(BLOCK_WORDS, 0);
        for word in padded {
            file.write_all(&word.to_le_bytes()).unwrap();
        }
    }
    file.flush().unwrap();
    file
}

// Three good blocks around one bad one.
fn run_file() -> NamedTempFile {
    write_blocks(&[
        vec![encode_header(1), e_word(0, 10), encode_header(2), e_word(1, 11), e_word(2, 12)],
        vec![encode_header(1), e_word(3, 13), 0xDEAD_BEEF],
        vec![encode_header(3), e_word(4, 14), e_word(5, 15), e_word(6, 16)],
        vec![encode_header(0)],
    ])
}

fn template() -> FixedBlock {
    FixedBlock::new(BLOCK_WORDS).unwrap()
}

fn sort_with(config: &SortConfig, path: &std::path::Path) -> (Vec<u16>, sirisort_io::SortSummary) {
    let mut adcs = Vec::new();
    let mut sink = |event: &Event| adcs.extend(event.e.iter().map(|e| e.adc));
    let mut source = config.make_source(&template());
    let summary = sort_file(source.as_mut(), path, config, &mut sink, &CancelToken::new()).unwrap();
    (adcs, summary)
}

#[test]
fn test_both_strategies_sort_the_same_events() {
    let file = run_file();
    for strategy in [FetchStrategy::Sequential, FetchStrategy::Prefetch] {
        let config = SortConfig::default().with_strategy(strategy);
        let (adcs, summary) = sort_with(&config, file.path());

        assert_eq!(adcs, [10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(summary.blocks, 4);
        assert_eq!(summary.bad_blocks, 1);
        assert_eq!(summary.events, 5);
        // (1 + 2 + 1 + 3 + 0) / 5
        assert_relative_eq!(summary.average_event_length, 7.0 / 5.0);
        assert!(!summary.cancelled);
    }
}

#[test]
fn test_start_and_max_blocks() {
    let file = run_file();
    let config = SortConfig::default().with_start_block(2).with_max_blocks(1);
    let (adcs, summary) = sort_with(&config, file.path());
    assert_eq!(adcs, [14, 15, 16]);
    assert_eq!(summary.blocks, 1);

    let past_end = SortConfig::default().with_start_block(10);
    let (adcs, summary) = sort_with(&past_end, file.path());
    assert!(adcs.is_empty());
    assert_eq!(summary.blocks, 0);
}

#[test]
fn test_cancel_stops_between_events() {
    let file = run_file();
    let cancel = CancelToken::new();
    let mut events = 0;
    let mut sink = |_: &Event| {
        events += 1;
        if events == 2 {
            cancel.cancel();
        }
    };
    let config = SortConfig::default();
    let mut source = config.make_source(&template());
    let summary = sort_file(source.as_mut(), file.path(), &config, &mut sink, &cancel).unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.events, 2);
    assert_eq!(summary.blocks, 1);
}

#[test]
fn test_read_error_names_the_block() {
    let mut file = run_file();
    file.write_all(&[0u8; 6]).unwrap();
    file.flush().unwrap();

    let config = SortConfig::default();
    let mut source = config.make_source(&template());
    let err = sort_file(
        source.as_mut(),
        file.path(),
        &config,
        &mut |_: &Event| {},
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Read { block: 4, .. }));
}

#[test]
fn test_missing_file_is_an_error() {
    let config = SortConfig::default().with_strategy(FetchStrategy::Sequential);
    let mut source = config.make_source(&template());
    let err = sort_file(
        source.as_mut(),
        std::path::Path::new("/nonexistent/run.data"),
        &config,
        &mut |_: &Event| {},
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
