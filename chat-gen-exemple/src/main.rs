use chat_gen_core::model::chat_model::ChatModel;
use chat_gen_core::model::config::ConfigPatch;
use chat_gen_core::model::trainer::TranscriptRow;

/// A small transcript sample, one row per line: username, moderation
/// flags ("NULL" means none) and the message content. Parsing real
/// transcript sources (CSV, JSON, a database) into rows is the
/// caller's job; the model only consumes already-parsed rows.
const TRANSCRIPT: &[(&str, &str, &str)] = &[
    ("alice", "NULL", "salut tout le monde"),
    ("bob", "NULL", "salut alice ça va ?"),
    ("alice", "NULL", "ça va très bien merci"),
    ("carol", "NULL", "quelqu'un a vu le match hier ?"),
    ("bob", "NULL", "oui le match était incroyable"),
    ("alice", "NULL", "le match était un peu long"),
    ("carol", "NULL", "très bien joué quand même"),
    ("dave", "bannable", "contenu signalé par la modération"),
    ("spammer", "NULL", "achetez mes trucs ici"),
    ("bob", "NULL", "on se voit demain tout le monde"),
    ("carol", "NULL", "salut à demain"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Start from the default configuration and ignore a noisy user.
    // Configuration is a flat object merged later-wins, so only the
    // fields set here change.
    let mut model = ChatModel::default();
    model.update_config(ConfigPatch {
        min_length: Some(2),
        ignored_users: Some(vec!["Spammer".to_owned()]),
        ..ConfigPatch::default()
    })?;

    // Train row by row. Rejected rows (flagged as bannable, ignored
    // users) simply return false, they are never an error.
    let mut accepted = 0;
    for (username, flags, content) in TRANSCRIPT {
        let row = TranscriptRow::new(*username, *flags, *content);
        if model.train(&row) {
            accepted += 1;
        }
    }
    println!("Learned {accepted}/{} rows, vocabulary of {} tokens", TRANSCRIPT.len(), model.vocabulary());

    // Generate a few sentences seeded at the start sentinel, with the
    // trace of each run showing how many transitions resolved through
    // the bigram table (advanced) versus the unigram fallback (simple).
    for i in 0..10 {
        let sentence = model.generate()?;
        println!("Generated sentence {}: {}", i + 1, sentence);
        if let Some(trace) = model.last_trace() {
            match trace.advanced_ratio() {
                Some(ratio) => println!(
                    "  {} advanced / {} simple ({ratio:.0}% advanced), {} authors",
                    trace.advanced_count(),
                    trace.simple_count(),
                    trace.authors().len()
                ),
                None => println!("  no transitions resolved"),
            }
        }
    }

    // Seeding at a known word keeps it as the first word.
    println!("Seeded at 'salut': {}", model.generate_from("salut")?);

    // An unknown seed is a typed failure.
    match model.generate_from("jamais-appris") {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Unknown seed rejected: {e}"),
    }

    // The model serializes to compact bytes; where they go is up to
    // the caller. Round-trip through a file to show the full path.
    let bytes = model.snapshot()?;
    let path = std::env::temp_dir().join("chat-gen-exemple.bin");
    std::fs::write(&path, &bytes)?;
    println!("Snapshot written to {} ({} bytes)", path.display(), bytes.len());

    let mut restored = ChatModel::from_snapshot(&std::fs::read(&path)?)?;
    println!("Restored model generates: {}", restored.generate()?);

    Ok(())
}
