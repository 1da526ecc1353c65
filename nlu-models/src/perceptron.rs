//! # Averaged Perceptron
//!
//! Classificador linear multiclasse compartilhado pelos modelos `text` e `tagger`.
//! Utiliza "Lazy Averaging" para evitar custo O(N*T) na atualização dos pesos médios.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Perceptron médio sobre vetores de features esparsos.
///
/// O Perceptron é um algoritmo **online** e **mistake-driven**: processa um exemplo
/// por vez e só mexe nos pesos quando erra. O modelo final usa a **média** dos pesos
/// ao longo de todos os passos, o que estabiliza o aprendizado.
///
/// # Lazy Averaging
/// A média de um peso só é acumulada quando ele muda, guardando o passo da última
/// atualização. [`AveragedPerceptron::finalize`] fecha as contas no fim do treino.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AveragedPerceptron {
    /// Pesos atuais $w$: (feature, classe) -> peso.
    weights: HashMap<(String, String), f64>,
    /// Soma acumulada dos pesos: (feature, classe) -> $\sum w_t$.
    totals: HashMap<(String, String), f64>,
    /// Passo em que cada peso foi atualizado pela última vez.
    last_update: HashMap<(String, String), usize>,
    /// Exemplos processados.
    steps: usize,
    /// Classes conhecidas, em ordem.
    classes: Vec<String>,
}

impl AveragedPerceptron {
    /// Cria o perceptron para o conjunto de classes dado (ordenado e sem repetição).
    pub fn new(mut classes: Vec<String>) -> Self {
        classes.sort();
        classes.dedup();
        Self {
            classes,
            ..Self::default()
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Classe de maior pontuação. Empates ficam com a primeira classe.
    pub fn predict(&self, fv: &FeatureVector) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for class in &self.classes {
            let score = self.score(fv, class);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((class.as_str(), score));
            }
        }
        best.map(|(class, _)| class)
    }

    fn score(&self, fv: &FeatureVector, class: &str) -> f64 {
        fv.features
            .iter()
            .filter_map(|(fname, fval)| {
                self.weights
                    .get(&(fname.clone(), class.to_string()))
                    .map(|w| w * fval)
            })
            .sum()
    }

    /// Um passo de treino. Devolve `true` se a predição estava errada.
    ///
    /// $w_{correto} \leftarrow w_{correto} + \phi(x)$
    /// $w_{errado} \leftarrow w_{errado} - \phi(x)$
    pub fn train_step(&mut self, fv: &FeatureVector, gold: &str) -> bool {
        let predicted = self.predict(fv).map(str::to_string);
        let mistake = predicted.as_deref() != Some(gold);

        if mistake {
            for (fname, fval) in &fv.features {
                self.update_feature(fname, gold, *fval);
                if let Some(predicted) = &predicted {
                    self.update_feature(fname, predicted, -fval);
                }
            }
        }
        self.steps += 1;
        mistake
    }

    /// Atualiza uma feature específica aplicando Lazy Averaging.
    fn update_feature(&mut self, fname: &str, class: &str, delta: f64) {
        let key = (fname.to_string(), class.to_string());

        // Acumula o peso ANTIGO pelos passos em que ficou constante
        let current = self.weights.get(&key).copied().unwrap_or(0.0);
        let last = self.last_update.get(&key).copied().unwrap_or(0);
        *self.totals.entry(key.clone()).or_insert(0.0) += (self.steps - last) as f64 * current;
        self.last_update.insert(key.clone(), self.steps);

        *self.weights.entry(key).or_insert(0.0) += delta;
    }

    /// Substitui os pesos pelas médias ($\sum w_t / T$) e descarta os acumuladores.
    pub fn finalize(&mut self) {
        let steps = self.steps;
        for (key, weight) in &self.weights {
            let last = self.last_update.get(key).copied().unwrap_or(0);
            *self.totals.entry(key.clone()).or_insert(0.0) += (steps - last) as f64 * weight;
        }

        if steps > 0 {
            for (key, total) in self.totals.drain() {
                self.weights.insert(key, total / steps as f64);
            }
        }

        self.totals.clear();
        self.last_update.clear();
    }
}
