
pub(super) const PEOPLE_TTL: &str = r#"
@prefix ex: <http://example.org/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .

ex:Person a owl:Class ;
    rdfs:label "Person" ;
    rdfs:comment "A human being" .
ex:Pet a rdfs:Class .

ex:name a owl:DatatypeProperty ;
    rdfs:domain ex:Person ;
    rdfs:range <http://www.w3.org/2001/XMLSchema#string> .
ex:owns a owl:ObjectProperty ;
    rdfs:domain ex:Person ;
    rdfs:range ex:Pet .

ex:alice a ex:Person ;
    rdfs:label "Alice"@en ;
    ex:name "Alice" ;
    ex:owns ex:rex .
ex:bob a ex:Person .
ex:rex a ex:Pet .
"#;
