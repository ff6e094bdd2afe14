pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Average distance of each sample from the sample mean.
pub fn mean_abs_deviation(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let deviations = data
        .iter()
        .map(|value| (value - data_mean).abs())
        .collect::<Vec<f64>>();

    mean(&deviations)
}

/// Splits on single spaces only, so runs of spaces yield empty words.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split(' ').collect()
}
