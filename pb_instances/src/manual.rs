/*!

This is the long-form manual for `pb_instances` and `pbsweep`.

## Model

An experiment produces families of participatory budgeting instances that only
differ in how the project costs relate to the votes.

1. The approval ballots of `numVotes` voters over `numProjects` projects are
   sampled once with the disjoint resampling model.
2. The ballots are tallied. Project `pi` receives `count[i]` approvals and its
   proportional cost is `floor(count[i] / numVotes * budget)`.
3. The proportionality probability starts at `propProbStart` and is decreased by
   `propProbStep` before each instance is created. For every project of an
   instance, a uniform number `r` in `[0, 1)` is drawn. If `r` is larger than the
   probability, the cost is drawn from a normal distribution centered halfway
   between the proportional cost and the budget (standard deviation `sigma`),
   rounded and clamped into `[proportional cost, budget]`. Otherwise the cost is
   the proportional cost.

The first instance of a sweep therefore uses `propProbStart - propProbStep`. When
`numInstances * propProbStep` exceeds `propProbStart`, the last probabilities are
negative and every project of these instances is inflated. Set `sweepBounds` to
`clamp` to stop the sweep at zero instead.

## Running

```bash
pbsweep --config experiment.json --seed 7 --out summary.json
```

Each instance is written as `instance_<election>_<variant>.json` in the output
directory, with the profile shared by all the variants of an election. The
summary lists for every election the probabilities of the sweep and, for every
instance, its costs and the arrays used by the statistics:

- `budgetPerc` the share of the budget of each project
- `votesPerc` the share of the voters approving each project
- `differences` the difference between the two

With a fixed seed the output is reproducible. Passing `--reference` with a
previous summary checks that a run produces exactly the same output.

## Configuration

All the fields are optional.

| field | default | |
|-------|---------|-|
| `numElections` | 100 | number of independent ballot samples |
| `numVotes` | 1000 | voters per election |
| `numProjects` | 20 | projects per election |
| `budget` | 500000 | budget limit |
| `numInstances` | 40 | instances per sweep |
| `propProbStart` | 1.0 | |
| `propProbStep` | 0.025 | |
| `sigma` | 20000 | standard deviation of inflated costs |
| `sweepBounds` | `extrapolate` | `extrapolate` or `clamp` |
| `sampler` | | `phi` (0.75), `relSizeCentralVote` (0.125), `numCentralVotes` (2) |
| `seed` | | seed of the random generator, from the system entropy if missing |
| `outputDirectory` | `instances` | relative to the configuration file |

```text
{
  "numElections": 10,
  "numVotes": 1000,
  "numProjects": 20,
  "budget": 500000,
  "numInstances": 40,
  "sampler": { "numCentralVotes": 4 },
  "seed": 7
}
```

 */
