use pcfg_mc_core::estimate::estimator::Estimation;
use pcfg_mc_core::evaluation::Evaluator;
use pcfg_mc_core::model::classifier::CharClass;
use pcfg_mc_core::model::grammar_model::{GrammarModel, TerminalSlot};
use pcfg_mc_core::model::sampler::Sampler;
use pcfg_mc_core::model::scorer::Scorer;
use pcfg_mc_core::report::format_point;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Build a small model by hand instead of loading a trained directory
    // ('DirectoryLoader::new("./model").load()' would do the same from disk)
    let mut builder = GrammarModel::builder();

    // Structures: 4 letters + 2 digits, 4 digits, 3 letters + 1 symbol
    builder.structure("LLLLDD".parse()?, 0.5)?;
    builder.structure("DDDD".parse()?, 0.3)?;
    builder.structure("LLLS".parse()?, 0.2)?;

    // Digit and symbol terminals carry trained probabilities
    let digits = |n| TerminalSlot::new(CharClass::Digit, n);
    builder.terminal(digits(2), "12", 0.5)?.terminal(digits(2), "69", 0.3)?.terminal(digits(2), "00", 0.2)?;
    builder.terminal(digits(4), "1234", 0.6)?.terminal(digits(4), "2024", 0.4)?;
    builder.terminal(TerminalSlot::new(CharClass::Symbol, 1), "!", 1.0)?;

    // Letter terminals are uniform over the dictionary words of each length
    builder.dictionary(["love", "hate", "blue", "star", "cat", "dog", "sun"]);
    let model = builder.build();

    // Probability of a few passwords ('inf' means the model cannot produce it)
    let scorer = Scorer::new(&model);
    for password in ["love12", "1234", "cat!", "love 12", "zebra1"] {
        println!("{password:?}: p = {}, log prob = {}", scorer.probability(password), scorer.log_prob(password));
    }

    // Draw 10000 samples; a seed makes the run reproducible
    let samples = Sampler::new(&model)?.sample(10_000, Some(42))?;
    for sample in samples.samples().iter().take(5) {
        println!("Sampled {:?} ({:.3} bits)", sample.password, sample.log_prob);
    }

    // The evaluator prepares the sorted samples once, then answers every query
    let evaluator = Evaluator::new(&model, &samples)?;
    for password in ["love12", "star00", "2024", "sun!", "qwerty"] {
        match evaluator.estimate(password) {
            Estimation::Guesses(n) => println!("{password}: cracked after about {n} guesses"),
            Estimation::Unreachable => println!("{password}: never guessed by this model"),
        }
    }

    // Guess/crack curve of a tiny test set, up to 10^20 guesses
    let evaluation = evaluator.evaluate(["love12", "star00", "2024", "sun!", "qwerty"], 100_000_000_000_000_000_000);
    for point in &evaluation.curve {
        println!("{}", format_point(point));
    }

    Ok(())
}
