mod spectrum_bars;

pub use spectrum_bars::SpectrumBars;
