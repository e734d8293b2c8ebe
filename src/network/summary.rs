use std::collections::HashMap;
use std::fmt;

use crate::network::network::Network;

const WIDTH: usize = 65;

/// Printable architecture table, in the layout Keras users expect.
pub struct Summary<'a> {
    network: &'a Network,
}

impl<'a> Summary<'a> {
    pub fn new(network: &'a Network) -> Summary<'a> {
        Summary { network }
    }

    /// `(name, type, output width, params)` per layer; repeated layer types
    /// are numbered `dense`, `dense_1`, `dense_2`, ...
    pub fn rows(&self) -> Vec<(String, &'static str, usize, usize)> {
        let mut seen: HashMap<&'static str, usize> = HashMap::new();
        self.network.layers.iter()
            .map(|layer| {
                let base = layer.base_name();
                let n = seen.entry(base).or_insert(0);
                let name = if *n == 0 { base.to_owned() } else { format!("{}_{}", base, n) };
                *n += 1;
                (name, layer.kind(), layer.output_size(), layer.param_count())
            })
            .collect()
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: \"sequential\"")?;
        writeln!(f, "{}", "_".repeat(WIDTH))?;
        writeln!(f, " {:<27} {:<25} {}", "Layer (type)", "Output Shape", "Param #")?;
        writeln!(f, "{}", "=".repeat(WIDTH))?;
        let rows = self.rows();
        for (i, (name, kind, width, params)) in rows.iter().enumerate() {
            let label = format!("{} ({})", name, kind);
            let shape = format!("(None, {})", width);
            writeln!(f, " {:<27} {:<25} {}", label, shape, params)?;
            if i + 1 < rows.len() {
                writeln!(f)?;
            }
        }
        let total = self.network.param_count();
        writeln!(f, "{}", "=".repeat(WIDTH))?;
        writeln!(f, "Total params: {}", total)?;
        writeln!(f, "Trainable params: {}", total)?;
        writeln!(f, "Non-trainable params: 0")?;
        write!(f, "{}", "_".repeat(WIDTH))
    }
}

#[cfg(test)]
mod tests {
    use crate::network::spec::NetworkSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fashion_model_summary_lists_layers_and_totals() {
        let net = NetworkSpec::fashion_mnist(128, false)
            .build(&mut StdRng::seed_from_u64(0))
            .unwrap();
        let text = net.summary().to_string();
        assert!(text.starts_with("Model: \"sequential\""));
        assert!(text.contains("flatten (Flatten)"));
        assert!(text.contains("(None, 784)"));
        assert!(text.contains("dense (Dense)"));
        assert!(text.contains("100480"));
        assert!(text.contains("dense_1 (Dense)"));
        assert!(text.contains("1290"));
        assert!(text.contains("Total params: 101770"));
        assert!(text.contains("Non-trainable params: 0"));
    }
}
