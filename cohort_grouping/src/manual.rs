/*!

This is the long-form manual for `cohort_grouping` and `sortinghat`.

## Input formats

The following formats are supported:
* `csv`, `xlsx` a cohort table with one row per student
* `canvas`, `canvas_xlsx` a quiz download from the Canvas learning platform

### `csv` and `xlsx`

The first row is the header. It must contain a `name` and a `sid` column.
Every other column named after a configured attribute holds the selection of the
student for this attribute. A column named `<attribute> Flexibility` holds how
flexible the student is about this attribute, on a scale from 1 to 10. A blank
cell means that the student did not answer, and the default flexibility of 10 applies.

```text
name,sid,Mode,Mode Flexibility,Time
Anna,1001,Online,2,Morning
Bob,1002,In person,,Evening
```

### `canvas` and `canvas_xlsx`

The quiz export of Canvas has at least 15 columns. The name of the student is read
in the first column, the student id in the third column, the preferred meeting
times (separated by commas) in the ninth column and the preferred mode of meeting
in the eleventh column. Shorter rows are skipped.

## Strategies

* `chunk` keeps the order of the input and cuts it into groups of the desired size.
The last group holds what remains.
* `preference` sorts the students by preferred times then mode, and cuts the sorted
list into groups of the desired size or one less.
* `greedy` puts together the most compatible pairs first. The number of groups is
the smallest one allowed by the maximum size, and the groups are as even as possible.
* `annealing` starts from the greedy allocation and swaps members between groups
so that all the groups end up with a similar compatibility.

## Compatibility scores

For two students and one attribute, the compatibility matrix of the attribute gives a
raw score. This score is multiplied by `1 - f / 10` where `f` is the larger of the two
flexibilities. The pair compatibility score (PCS) is the sum of these scores weighted
by the attribute weights. The group compatibility score (GCS) is the average PCS of
all the pairs in the group.

## Configuration

A configuration file describes the attributes, where to read the students and the
rules to apply:

```json
{
  "outputSettings": { "cohortName": "COMP1000 tutorials", "outputLayout": "joined" },
  "inputSources": [ { "provider": "csv", "filePath": "students.csv" } ],
  "attributes": [
    {
      "name": "Mode",
      "description": "Preferred way of meeting",
      "selections": ["Online", "In person"],
      "compatibilityMatrix": {
        "Online": { "Online": 1, "In person": 0.2 },
        "In person": { "Online": 0.2, "In person": 1 }
      },
      "defaultWeight": 0.8,
      "enabledByDefault": true
    }
  ],
  "customSettings": { "weights": { "Mode": "None" }, "enabled": {} },
  "rules": { "strategy": "greedy", "minGroupSize": 3, "maxGroupSize": 5, "randomSeed": "42" }
}
```

## Output

The groups are written as CSV. The `joined` layout has a header and one row per group
with the names separated by commas. The `wide` layout has no header and puts each name
in its own cell.

*/
