use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nerkit_core::{ProcessingOptions, Processor, Vocabulary, UNK};

fn bench_process_word(c: &mut Criterion) {
    let words = Vocabulary::from_tokens(
        [UNK, "eu", "rejects", "german", "call", "to", "boycott", "british", "lamb"]
            .into_iter(),
    );
    let chars = Vocabulary::from_tokens(('a'..='z').chain('A'..='Z').map(String::from));
    let processor = Processor::new(words, Some(chars), ProcessingOptions::words(true)).unwrap();

    let sentence = ["EU", "rejects", "German", "call", "to", "boycott", "British", "lamb", "."];

    c.bench_function("process_word_single", |b| {
        b.iter(|| processor.process(black_box("German")).unwrap());
    });

    c.bench_function("process_word_sentence_9", |b| {
        b.iter(|| {
            for token in &sentence {
                let _ = processor.process(black_box(token)).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_process_word);
criterion_main!(benches);
