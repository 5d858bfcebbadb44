/*!

This is the long-form manual for `bws_design` and `bwsgen`.

## Workflow

A Best-Worst Scaling study goes through three steps:

1. **Design**: the items are grouped into small tuples (4 items, or 5 items for pools of
   more than 1000 items). The generator draws `2 x (number of items)` tuples
   (`1.5 x` for pools of more than 10000 items that are a multiple of 4), such that
   every item and every pair of items appears about the same number of times. It runs
   100 randomized trials and keeps the one with the lowest standard deviation of the
   pair co-occurrence counts.
2. **Batches**: the tuples are shuffled and split into batches of 20 tuples. A last
   batch of at least 5 tuples is kept as is; fewer leftover tuples are spread over the
   other batches. Designs of 20 tuples or fewer are split into batches of 5 instead.
3. **Scores**: for each tuple, annotators pick the best and the worst item. The score of
   an item is `(#best - #worst) / #tuples containing the item`, between -1 and 1.

## Input formats

### Item files

Plain text, UTF-8, one item per line. Empty lines are ignored, and an item listed
several times (in one file or across files) is only used once.

```text
interesting
boring
fantastic
```

At least 5 distinct items are required.

### Annotation files

CSV files, one annotation per row. The first column is the item chosen as best, the
second column is the item chosen as worst, the following columns are the items of the
tuple that was presented:

```text
best,worst,item 1,item 2,item 3,item 4
fantastic,boring,boring,joyful,fantastic,annoyed
```

The header row is optional. It is recognized by its first cell being `best`.

## Configuration

`bwsgen generate` accepts a configuration file in JSON. All the fields are optional;
options given on the command line override the values of the file.

```text
{
  "itemSources": ["movie_reviews.txt"],
  "design": {
    "tupleSize": 4,
    "factor": 2.0,
    "numTuples": 32,
    "iterations": 100,
    "seed": 42,
    "timeBudgetMs": 10000,
    "parallel": true
  },
  "batches": { "batchSize": 20, "minimum": 5 },
  "output": {
    "projectName": "movie reviews",
    "summaryPath": "design.json",
    "reportPath": "design.txt"
  }
}
```

Relative paths in `itemSources` are resolved from the directory of the configuration
file.

- `tupleSize`, `factor`, `numTuples`: when missing, they follow the sizing policy
   described above. `numTuples` takes precedence over `factor`.
- `seed`: two runs with the same seed and the same items produce the same design and
   the same batches.
- `timeBudgetMs`: trials that have not started after this duration are skipped.
- `parallel`: runs the trials on all the cores. The result does not depend on it.

## Outputs

The summary of a design is a JSON document with the resolved configuration, the balance
statistics, a fingerprint of the tuple set, the tuples and the batches.

Without an output location, the summary is printed on the standard output.

The scores are written as one `item<TAB>score` line per item, by decreasing score.
`bwsgen score --report` also lists every annotated tuple with its best and worst
choices.

A design may not ask for more than 1000 tuples per item.

 */
