use super::Hmm;
use crate::distributions::rng_from_seed;
use crate::error::Result;
use rand::rngs::StdRng;
use rand::Rng;

/// Generates state and observation sequences from an [`Hmm`].
pub struct MarkovGenerator<'a, O> {
    hmm: &'a Hmm<O>,
    rng: StdRng,
    state: Option<usize>,
}

impl<'a, O> MarkovGenerator<'a, O> {
    /// Seeded when `seed` is given, from entropy otherwise.
    pub fn new(hmm: &'a Hmm<O>, seed: Option<u64>) -> Self {
        Self {
            hmm,
            rng: rng_from_seed(seed),
            state: None,
        }
    }

    /// Current state, `None` before the first draw.
    pub fn state(&self) -> Option<usize> {
        self.state
    }

    /// Forgets the current state so that the next draw starts from the
    /// initial distribution.
    pub fn new_sequence(&mut self) {
        self.state = None;
    }

    /// Moves to the next state and returns it.
    pub fn next_state(&mut self) -> Result<usize> {
        let nb_states = self.hmm.nb_states();
        let next = match self.state {
            None => {
                let weights = (0..nb_states)
                    .map(|i| self.hmm.pi(i))
                    .collect::<Result<Vec<_>>>()?;
                sample_index(&weights, &mut self.rng)
            }
            Some(current) => {
                let weights = (0..nb_states)
                    .map(|j| self.hmm.a_ij(current, j))
                    .collect::<Result<Vec<_>>>()?;
                sample_index(&weights, &mut self.rng)
            }
        };
        self.state = Some(next);
        Ok(next)
    }

    /// Moves to the next state and draws an observation from its opdf.
    pub fn observation(&mut self) -> Result<O> {
        let state = self.next_state()?;
        self.hmm.opdf(state)?.generate(&mut self.rng)
    }

    pub fn state_sequence(&mut self, length: usize) -> Result<Vec<usize>> {
        self.new_sequence();
        (0..length).map(|_| self.next_state()).collect()
    }

    pub fn observation_sequence(&mut self, length: usize) -> Result<Vec<O>> {
        self.new_sequence();
        (0..length).map(|_| self.observation()).collect()
    }

    pub fn observation_sequences(&mut self, count: usize, length: usize) -> Result<Vec<Vec<O>>> {
        (0..count)
            .map(|_| self.observation_sequence(length))
            .collect()
    }
}

/// Draws an index with probability proportional to `weights`.
fn sample_index(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    let threshold = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if threshold < cumulative {
            return i;
        }
    }
    weights.len() - 1
}
